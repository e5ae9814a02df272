//! Core campaign engine for the Activity Manager bot.
//!
//! This crate is intentionally framework-agnostic. Discord lives behind the
//! [`messaging::port::CommunityPort`] trait, implemented in the adapter crate.

pub mod campaign;
pub mod commands;
pub mod config;
pub mod counters;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod notifier;
pub mod orchestrator;
pub mod security;

#[cfg(test)]
mod test_support;

pub use errors::{Error, Result};

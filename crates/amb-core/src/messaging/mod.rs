//! Platform-facing abstractions (Discord today, behind a port).

pub mod port;
pub mod types;

//! Discord entry points.
//!
//! Slash and prefix invocations are thin adapters: they build an `Invoker`,
//! call the shared command runner, and deliver its reply in their own way
//! (ephemeral interaction response vs. channel message).

use std::sync::Arc;

use serenity::all::{CommandInteraction, Context, Message};

use crate::router::AppState;

mod commands;
mod prefix;
mod slash;

pub async fn handle_slash(ctx: Context, command: CommandInteraction, state: Arc<AppState>) {
    slash::handle(ctx, command, state).await
}

pub async fn handle_message(ctx: Context, msg: Message, state: Arc<AppState>) {
    if msg.author.bot {
        return;
    }
    prefix::handle(ctx, msg, state).await
}

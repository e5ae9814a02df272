use std::sync::Arc;

use serenity::all::{Context, CreateMessage, Message};
use tracing::warn;

use amb_core::commands::{parse_prefix_command, CommandKind};

use super::commands::{help_embed, invoker, launch};
use crate::router::AppState;

pub(super) async fn handle(ctx: Context, msg: Message, state: Arc<AppState>) {
    let Some(kind) = parse_prefix_command(&msg.content, &state.cfg.command_prefix) else {
        return;
    };

    match kind {
        CommandKind::Help => {
            let embed = help_embed(&state.cfg.command_prefix, &msg.author.tag());
            if let Err(e) = msg
                .channel_id
                .send_message(&ctx, CreateMessage::new().embed(embed))
                .await
            {
                warn!(error = %e, "failed to answer help");
            }
        }

        CommandKind::Launch(campaign) => {
            let roles = msg
                .member
                .as_ref()
                .map(|m| m.roles.clone())
                .unwrap_or_default();

            let typing = msg.channel_id.start_typing(&ctx.http);
            let text = launch(&ctx, &state, campaign, invoker(&msg.author, &roles)).await;
            typing.stop();

            if let Err(e) = msg.channel_id.say(&ctx, text).await {
                warn!(error = %e, "failed to reply to prefix command");
            }
        }
    }
}

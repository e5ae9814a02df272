use std::sync::Arc;

use serenity::all::{
    CommandInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
    CreateMessage, EditInteractionResponse,
};
use tracing::{debug, warn};

use amb_core::commands::CommandKind;

use super::commands::{help_embed, invoker, launch};
use crate::router::AppState;

pub(super) async fn handle(ctx: Context, command: CommandInteraction, state: Arc<AppState>) {
    let Some(kind) = CommandKind::from_name(&command.data.name) else {
        debug!(name = %command.data.name, "ignoring unknown slash command");
        return;
    };

    match kind {
        CommandKind::Help => {
            let embed = help_embed(&state.cfg.command_prefix, &command.user.tag());
            let response = CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new().embed(embed),
            );
            if let Err(e) = command.create_response(&ctx, response).await {
                warn!(error = %e, "failed to answer /help");
            }
        }

        CommandKind::Launch(campaign) => {
            // Bulk DMs outlive the 3s interaction window; defer first.
            if let Err(e) = command.defer_ephemeral(&ctx).await {
                warn!(error = %e, "failed to defer interaction");
                return;
            }

            let roles = command
                .member
                .as_ref()
                .map(|m| m.roles.clone())
                .unwrap_or_default();
            let text = launch(&ctx, &state, campaign, invoker(&command.user, &roles)).await;

            let edit = EditInteractionResponse::new().content(text.clone());
            if let Err(e) = command.edit_response(&ctx, edit).await {
                // Interaction tokens expire after 15 minutes; fall back to a DM.
                warn!(error = %e, "interaction expired; sending result by DM");
                if let Err(e) = command
                    .user
                    .direct_message(&ctx, CreateMessage::new().content(text))
                    .await
                {
                    warn!(error = %e, "failed to DM launch result to invoker");
                }
            }
        }
    }
}

use chrono::Utc;
use serenity::all::{Context, CreateEmbed, CreateEmbedFooter, RoleId as DcRoleId, User};

use amb_core::{
    commands::{help_entries, HELP_DESCRIPTION, HELP_TITLE},
    domain::{CampaignKind, Invoker, RoleId, UserId},
    formatting::{launch_success_notice, MESSAGE_LIMIT},
    messaging::types::Accent,
    orchestrator::LaunchRequest,
};

use crate::{colour, router::AppState};

pub(super) fn invoker(user: &User, roles: &[DcRoleId]) -> Invoker {
    Invoker {
        id: UserId(user.id.get()),
        display_name: user.tag(),
        role_ids: roles.iter().map(|r| RoleId(r.get())).collect(),
    }
}

pub(super) fn help_embed(prefix: &str, requested_by: &str) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(HELP_TITLE)
        .description(HELP_DESCRIPTION)
        .colour(colour(Accent::Blue));
    for entry in help_entries(prefix) {
        embed = embed.field(entry.name, entry.description, false);
    }
    embed.footer(CreateEmbedFooter::new(format!("Requested by {requested_by}")))
}

/// Run one campaign launch and turn the outcome into reply text.
pub(super) async fn launch(
    ctx: &Context,
    state: &AppState,
    kind: CampaignKind,
    invoker: Invoker,
) -> String {
    let req = LaunchRequest {
        kind,
        invoker,
        now: Utc::now(),
    };

    match state.orchestrator(ctx).launch(req, &state.shutdown).await {
        Ok(report) => launch_success_notice(kind, &report, MESSAGE_LIMIT),
        Err(e) => e.user_message().to_string(),
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    Client, Command, Context, CreateCommand, EventHandler, GatewayIntents, Interaction, Message,
    Ready,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use amb_core::{
    commands::SLASH_COMMANDS,
    config::Config,
    counters::CounterStore,
    orchestrator::CampaignOrchestrator,
};

use crate::handlers;
use crate::DiscordCommunity;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub counters: Arc<CounterStore>,
    /// Cancelled on shutdown; running DM batches stop at the next recipient.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Orchestrator bound to this event's HTTP client.
    pub fn orchestrator(&self, ctx: &Context) -> CampaignOrchestrator {
        let port = Arc::new(DiscordCommunity::new(ctx.http.clone()));
        CampaignOrchestrator::new(self.cfg.clone(), port, self.counters.clone())
    }
}

struct Handler {
    state: Arc<AppState>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.tag(), guilds = ready.guilds.len(), "logged in");

        let commands: Vec<CreateCommand> = SLASH_COMMANDS
            .iter()
            .map(|(name, description)| CreateCommand::new(*name).description(*description))
            .collect();

        match Command::set_global_commands(&ctx, commands).await {
            Ok(synced) => info!(count = synced.len(), "synced slash commands"),
            Err(e) => error!(error = %e, "failed to sync slash commands"),
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        handlers::handle_message(ctx, msg, self.state.clone()).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            handlers::handle_slash(ctx, command, self.state.clone()).await;
        }
    }
}

pub async fn run(cfg: Arc<Config>, counters: Arc<CounterStore>) -> anyhow::Result<()> {
    info!(
        server = %cfg.server_name,
        server_id = cfg.server_id.0,
        allowed_roles = cfg.allowed_roles.len(),
        prefix = %cfg.command_prefix,
        "starting discord client"
    );

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        counters,
        shutdown: CancellationToken::new(),
    });

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&cfg.discord_token, intents)
        .event_handler(Handler {
            state: state.clone(),
        })
        .await?;

    let shard_manager = client.shard_manager.clone();
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            return;
        }
        info!("shutting down");
        shutdown.cancel();
        shard_manager.shutdown_all().await;
    });

    client.start().await?;
    Ok(())
}

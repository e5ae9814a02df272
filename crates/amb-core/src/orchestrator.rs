//! One campaign launch, start to finish.
//!
//! authorize -> resolve targets -> allocate id -> compose -> publish -> bulk DM -> report
//!
//! Every step runs once; nothing is retried here. Steps before allocation never
//! touch the counter, so a refused or misconfigured launch does not burn an id.
//! A publish failure after allocation does leave a gap in the numbering.

use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    campaign::{compose, CampaignRecord, ComposeContext, PromptPicker, RandomPicker},
    config::Config,
    counters::{CounterName, CounterStore},
    domain::{CampaignKind, ChannelId, GuildId, Invoker, MessageRef},
    errors::Error,
    messaging::port::CommunityPort,
    notifier::{BulkNotifier, FailureReport, MemberCursor, Pacer, SleepPacer},
    security::is_authorized,
};

#[derive(Clone, Debug)]
pub struct LaunchRequest {
    pub kind: CampaignKind,
    pub invoker: Invoker,
    pub now: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct LaunchReport {
    pub campaign: CampaignRecord,
    pub message: MessageRef,
    pub failures: FailureReport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Guild(GuildId),
    Channel(ChannelId),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Guild(id) => write!(f, "server {}", id.0),
            Target::Channel(id) => write!(f, "channel {}", id.0),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("invoker lacks an allowed role")]
    Unauthorized,

    #[error("{0} not found")]
    TargetNotFound(Target),

    #[error("could not allocate campaign id: {0}")]
    PersistenceFailure(#[source] Error),

    #[error("publishing campaign #{campaign_id} failed: {source}")]
    PublishFailure {
        campaign_id: u64,
        #[source]
        source: Error,
    },
}

impl LaunchError {
    /// Short text for the invoker. Internal detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            LaunchError::Unauthorized => "🚫 You don't have permission to use this command!",
            LaunchError::TargetNotFound(_) => {
                "⚠️ The configured server or channel could not be found. Ask an admin to check the bot configuration."
            }
            LaunchError::PersistenceFailure(_) => {
                "⚠️ Could not record the campaign number, so nothing was sent. Please try again later."
            }
            LaunchError::PublishFailure { .. } => {
                "⚠️ Could not post the announcement, so no DMs were sent. Check the bot's channel permissions."
            }
        }
    }
}

pub struct CampaignOrchestrator {
    cfg: Arc<Config>,
    port: Arc<dyn CommunityPort>,
    counters: Arc<CounterStore>,
    picker: Arc<dyn PromptPicker>,
    notifier: BulkNotifier,
}

impl CampaignOrchestrator {
    pub fn new(
        cfg: Arc<Config>,
        port: Arc<dyn CommunityPort>,
        counters: Arc<CounterStore>,
    ) -> Self {
        let notifier = build_notifier(&cfg, port.clone(), Arc::new(SleepPacer));
        Self {
            cfg,
            port,
            counters,
            picker: Arc::new(RandomPicker),
            notifier,
        }
    }

    pub fn with_picker(mut self, picker: Arc<dyn PromptPicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.notifier = build_notifier(&self.cfg, self.port.clone(), pacer);
        self
    }

    pub async fn launch(
        &self,
        req: LaunchRequest,
        cancel: &CancellationToken,
    ) -> Result<LaunchReport, LaunchError> {
        let kind = req.kind;
        let invoker = &req.invoker;

        // 1. Authorize
        if !is_authorized(&invoker.role_ids, &self.cfg.allowed_roles) {
            info!(
                kind = kind.label(),
                user_id = invoker.id.0,
                user = %invoker.display_name,
                "launch denied"
            );
            return Err(LaunchError::Unauthorized);
        }

        // 2. Resolve targets
        let guild_id = self.cfg.server_id;
        let guild = match self.port.guild(guild_id).await {
            Ok(Some(g)) => g,
            Ok(None) => return Err(not_found(kind, Target::Guild(guild_id), None)),
            Err(e) => return Err(not_found(kind, Target::Guild(guild_id), Some(e))),
        };
        let channel_id = self.cfg.channel_for(kind);
        let channel = match self.port.channel(guild.id, channel_id).await {
            Ok(Some(c)) => c,
            Ok(None) => return Err(not_found(kind, Target::Channel(channel_id), None)),
            Err(e) => return Err(not_found(kind, Target::Channel(channel_id), Some(e))),
        };

        // 3. Allocate
        let campaign_id = self
            .counters
            .clone()
            .allocate(CounterName::for_kind(kind))
            .await
            .map_err(|e| {
                error!(kind = kind.label(), error = %e, "campaign id allocation failed");
                LaunchError::PersistenceFailure(e)
            })?;

        // 4. Compose
        let port = self.port.clone();
        let render = move |at: DateTime<Utc>| port.relative_time(at);
        let campaign = compose(
            kind,
            campaign_id,
            req.now,
            &ComposeContext {
                server_name: &self.cfg.server_name,
                guild_name: &guild.name,
                channel_mention: &channel.mention,
                invoker: &invoker.display_name,
                render_deadline: &render,
            },
            self.picker.as_ref(),
        );

        // 5. Publish
        let message = self
            .port
            .publish(channel.id, &campaign.announcement)
            .await
            .map_err(|e| {
                error!(
                    kind = kind.label(),
                    campaign_id,
                    channel_id = channel.id.0,
                    error = %e,
                    "publish failed after allocation; campaign id is now skipped"
                );
                LaunchError::PublishFailure {
                    campaign_id,
                    source: e,
                }
            })?;

        for emoji in &campaign.reactions {
            if let Err(e) = self.port.react(message, emoji).await {
                warn!(campaign_id, emoji = %emoji, error = %e, "failed to add reaction");
            }
        }

        info!(
            kind = kind.label(),
            campaign_id,
            channel_id = channel.id.0,
            channel = %channel.name,
            user = %invoker.display_name,
            "campaign published"
        );

        // 6. Bulk-notify
        let mut members =
            MemberCursor::new(self.port.clone(), guild.id, self.cfg.member_page_size);
        let failures = self
            .notifier
            .notify_all(&mut members, &campaign.direct_message, cancel)
            .await;

        // 7. Report
        Ok(LaunchReport {
            campaign: campaign.record,
            message,
            failures,
        })
    }
}

fn build_notifier(
    cfg: &Config,
    port: Arc<dyn CommunityPort>,
    pacer: Arc<dyn Pacer>,
) -> BulkNotifier {
    BulkNotifier::new(port, pacer, cfg.dm_delay, per_send_timeout(cfg))
}

fn per_send_timeout(cfg: &Config) -> Duration {
    cfg.dm_timeout.max(Duration::from_millis(1))
}

fn not_found(kind: CampaignKind, target: Target, cause: Option<Error>) -> LaunchError {
    match cause {
        Some(e) => warn!(
            kind = kind.label(),
            missing = %target,
            error = %e,
            "target lookup failed"
        ),
        None => warn!(kind = kind.label(), missing = %target, "target not found"),
    }
    LaunchError::TargetNotFound(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        campaign::FixedPicker,
        config::test_config,
        domain::{RoleId, UserId},
        messaging::types::{ChannelInfo, GuildInfo},
        test_support::{member, FakePort, RecordingPacer},
    };
    use chrono::TimeZone;

    struct Harness {
        _dir: tempfile::TempDir,
        port: Arc<FakePort>,
        counters: Arc<CounterStore>,
        orchestrator: CampaignOrchestrator,
    }

    fn default_port() -> FakePort {
        FakePort {
            guild: Some(GuildInfo {
                id: GuildId(10),
                name: "Reapers HQ".to_string(),
            }),
            channels: vec![
                ChannelInfo {
                    id: ChannelId(20),
                    name: "activity".to_string(),
                    mention: "<#20>".to_string(),
                },
                ChannelInfo {
                    id: ChannelId(30),
                    name: "general".to_string(),
                    mention: "<#30>".to_string(),
                },
            ],
            members: vec![
                member(1, "ana", false),
                member(2, "robo", true),
                member(3, "ben", false),
            ],
            ..Default::default()
        }
    }

    fn harness(port: FakePort) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Arc::new(test_config(dir.path().join("activity_data.json")));
        let counters = Arc::new(CounterStore::new(cfg.counter_file.clone()));
        counters.initialize().unwrap();
        let port = Arc::new(port);
        let orchestrator = CampaignOrchestrator::new(cfg, port.clone(), counters.clone())
            .with_picker(Arc::new(FixedPicker(0)))
            .with_pacer(Arc::new(RecordingPacer::default()));
        Harness {
            _dir: dir,
            port,
            counters,
            orchestrator,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 18, 30, 0).unwrap()
    }

    fn request(kind: CampaignKind, roles: Vec<RoleId>) -> LaunchRequest {
        LaunchRequest {
            kind,
            invoker: Invoker {
                id: UserId(77),
                display_name: "mod#0001".to_string(),
                role_ids: roles,
            },
            now: now(),
        }
    }

    fn authorized(kind: CampaignKind) -> LaunchRequest {
        request(kind, vec![RoleId(3), RoleId(100)])
    }

    #[tokio::test]
    async fn activity_check_end_to_end() {
        let h = harness(default_port());

        let report = h
            .orchestrator
            .launch(authorized(CampaignKind::ActivityCheck), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.campaign.campaign_id, 1);
        assert_eq!(report.campaign.deadline, now() + chrono::Duration::days(2));

        let published = h.port.published();
        assert_eq!(published.len(), 1);
        let (channel, announcement) = &published[0];
        assert_eq!(*channel, ChannelId(20));
        let token = format!("<t:{}:R>", (now() + chrono::Duration::days(2)).timestamp());
        assert!(announcement.body.contains(&token));
        assert!(announcement.title.contains("#1"));

        let reactions = h.port.reactions();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].0, report.message);

        assert_eq!(h.counters.snapshot().unwrap().last_check, 1);
        assert_eq!(h.counters.snapshot().unwrap().dead_chat_pings, 0);

        assert_eq!(h.port.dm_attempts(), vec![UserId(1), UserId(3)]);
        assert!(h.port.dm_texts().iter().all(|t| t.contains(&token)));
        assert_eq!(report.failures.delivered, 2);
    }

    #[tokio::test]
    async fn dead_chat_uses_its_own_channel_and_counter() {
        let h = harness(default_port());

        let report = h
            .orchestrator
            .launch(authorized(CampaignKind::DeadChat), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.campaign.campaign_id, 1);
        assert_eq!(report.campaign.deadline, now() + chrono::Duration::days(1));
        assert_eq!(report.message.channel_id, ChannelId(30));
        assert!(h.port.reactions().is_empty());
        assert_eq!(h.counters.snapshot().unwrap().dead_chat_pings, 1);
        assert_eq!(h.counters.snapshot().unwrap().last_check, 0);
    }

    #[tokio::test]
    async fn unauthorized_launch_changes_nothing() {
        let h = harness(default_port());

        let err = h
            .orchestrator
            .launch(
                request(CampaignKind::ActivityCheck, vec![RoleId(1), RoleId(2)]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchError::Unauthorized));
        assert!(err.user_message().contains("permission"));
        assert!(h.port.published().is_empty());
        assert!(h.port.dm_attempts().is_empty());
        assert_eq!(h.counters.snapshot().unwrap().last_check, 0);
    }

    #[tokio::test]
    async fn missing_channel_aborts_before_allocation() {
        let mut port = default_port();
        port.channels.retain(|c| c.id != ChannelId(20));
        let h = harness(port);

        let err = h
            .orchestrator
            .launch(authorized(CampaignKind::ActivityCheck), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LaunchError::TargetNotFound(Target::Channel(ChannelId(20)))
        ));
        assert_eq!(h.counters.snapshot().unwrap().last_check, 0);
        assert!(h.port.published().is_empty());
    }

    #[tokio::test]
    async fn missing_guild_aborts_before_allocation() {
        let mut port = default_port();
        port.guild = None;
        let h = harness(port);

        let err = h
            .orchestrator
            .launch(authorized(CampaignKind::DeadChat), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchError::TargetNotFound(Target::Guild(_))));
        assert_eq!(h.counters.snapshot().unwrap().dead_chat_pings, 0);
    }

    #[tokio::test]
    async fn corrupt_counters_abort_without_sending() {
        let h = harness(default_port());
        std::fs::write(h.counters.path(), "garbage").unwrap();

        let err = h
            .orchestrator
            .launch(authorized(CampaignKind::ActivityCheck), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchError::PersistenceFailure(_)));
        assert!(h.port.published().is_empty());
        assert!(h.port.dm_attempts().is_empty());
        assert_eq!(std::fs::read_to_string(h.counters.path()).unwrap(), "garbage");
    }

    #[tokio::test]
    async fn publish_failure_leaves_a_gap() {
        let mut port = default_port();
        port.fail_publish = true;
        let h = harness(port);

        let err = h
            .orchestrator
            .launch(authorized(CampaignKind::ActivityCheck), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LaunchError::PublishFailure { campaign_id: 1, .. }
        ));
        assert!(h.port.dm_attempts().is_empty());
        assert_eq!(h.counters.snapshot().unwrap().last_check, 1);
    }

    #[tokio::test]
    async fn reaction_failure_does_not_fail_launch() {
        let mut port = default_port();
        port.fail_react = true;
        let h = harness(port);

        let report = h
            .orchestrator
            .launch(authorized(CampaignKind::ActivityCheck), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.failures.delivered, 2);
        assert!(h.port.reactions().is_empty());
    }

    #[tokio::test]
    async fn unreachable_members_are_reported() {
        let mut port = default_port();
        port.unreachable.insert(UserId(3));
        let h = harness(port);

        let report = h
            .orchestrator
            .launch(authorized(CampaignKind::ActivityCheck), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.failures.failed_names(), vec!["ben"]);
        assert_eq!(report.failures.delivered, 1);
    }

    #[tokio::test]
    async fn concurrent_launches_get_distinct_ids() {
        let h = harness(default_port());
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(
            h.orchestrator
                .launch(authorized(CampaignKind::ActivityCheck), &cancel),
            h.orchestrator
                .launch(authorized(CampaignKind::ActivityCheck), &cancel),
        );

        let mut ids = vec![
            a.unwrap().campaign.campaign_id,
            b.unwrap().campaign.campaign_id,
        ];
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(h.counters.snapshot().unwrap().last_check, 2);
    }
}

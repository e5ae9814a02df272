//! Bulk direct-message fan-out.
//!
//! Members are pulled lazily from a [`RecipientSource`] and messaged one at a
//! time with a fixed pause between attempts. A failed recipient never aborts
//! the batch: unreachable members go into the [`FailureReport`], any other
//! error is logged and counted.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    domain::{GuildId, Recipient, UserId},
    errors::Error,
    messaging::port::CommunityPort,
    Result,
};

/// Lazy sequence of recipients.
#[async_trait]
pub trait RecipientSource: Send {
    async fn next(&mut self) -> Result<Option<Recipient>>;
}

/// Pages through a guild's members via [`CommunityPort::member_page`].
///
/// Holds at most one page in memory. A fresh cursor always starts from the
/// first member.
pub struct MemberCursor {
    port: Arc<dyn CommunityPort>,
    guild: GuildId,
    page_size: u16,
    after: Option<UserId>,
    buffered: VecDeque<Recipient>,
    exhausted: bool,
}

impl MemberCursor {
    pub fn new(port: Arc<dyn CommunityPort>, guild: GuildId, page_size: u16) -> Self {
        Self {
            port,
            guild,
            page_size: page_size.max(1),
            after: None,
            buffered: VecDeque::new(),
            exhausted: false,
        }
    }
}

#[async_trait]
impl RecipientSource for MemberCursor {
    async fn next(&mut self) -> Result<Option<Recipient>> {
        if self.buffered.is_empty() && !self.exhausted {
            let page = self
                .port
                .member_page(self.guild, self.after, self.page_size)
                .await?;
            if page.len() < self.page_size as usize {
                self.exhausted = true;
            }
            if let Some(last) = page.last() {
                self.after = Some(last.id);
            }
            debug!(guild = self.guild.0, fetched = page.len(), "member page");
            self.buffered.extend(page);
        }
        Ok(self.buffered.pop_front())
    }
}

/// In-memory source, mostly for tests and small fixed audiences.
pub struct VecSource(VecDeque<Recipient>);

impl VecSource {
    pub fn new(recipients: Vec<Recipient>) -> Self {
        Self(recipients.into())
    }
}

#[async_trait]
impl RecipientSource for VecSource {
    async fn next(&mut self) -> Result<Option<Recipient>> {
        Ok(self.0.pop_front())
    }
}

/// Delay between successive sends.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SleepPacer;

#[async_trait]
impl Pacer for SleepPacer {
    async fn pause(&self, delay: Duration) {
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationOutcome {
    Delivered,
    Forbidden,
    OtherError(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FailureReport {
    /// Recipients the platform refused to deliver to, in iteration order.
    pub failed: Vec<Recipient>,
    pub delivered: usize,
    /// Recipients that hit any other error (logged individually).
    pub errored: usize,
    pub cancelled: bool,
    /// The member listing broke off before the end.
    pub truncated: bool,
}

impl FailureReport {
    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|r| r.display_name.as_str()).collect()
    }

    fn record(&mut self, recipient: Recipient, outcome: NotificationOutcome) {
        match outcome {
            NotificationOutcome::Delivered => self.delivered += 1,
            NotificationOutcome::Forbidden => self.failed.push(recipient),
            NotificationOutcome::OtherError(detail) => {
                error!(
                    user_id = recipient.id.0,
                    user = %recipient.display_name,
                    error = %detail,
                    "failed to DM member"
                );
                self.errored += 1;
            }
        }
    }
}

pub struct BulkNotifier {
    port: Arc<dyn CommunityPort>,
    pacer: Arc<dyn Pacer>,
    delay: Duration,
    send_timeout: Duration,
}

impl BulkNotifier {
    pub fn new(
        port: Arc<dyn CommunityPort>,
        pacer: Arc<dyn Pacer>,
        delay: Duration,
        send_timeout: Duration,
    ) -> Self {
        Self {
            port,
            pacer,
            delay,
            send_timeout,
        }
    }

    pub async fn notify_all(
        &self,
        source: &mut dyn RecipientSource,
        text: &str,
        cancel: &CancellationToken,
    ) -> FailureReport {
        let mut report = FailureReport::default();
        let mut attempted = false;

        loop {
            if cancel.is_cancelled() {
                warn!(delivered = report.delivered, "bulk DM cancelled");
                report.cancelled = true;
                break;
            }

            let recipient = match source.next().await {
                Ok(Some(r)) => r,
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "member listing failed; stopping bulk DM");
                    report.truncated = true;
                    break;
                }
            };

            if recipient.is_bot {
                continue;
            }

            if attempted {
                self.pacer.pause(self.delay).await;
            }
            attempted = true;

            let outcome = self.deliver(&recipient, text).await;
            report.record(recipient, outcome);
        }

        info!(
            delivered = report.delivered,
            unreachable = report.failed.len(),
            errored = report.errored,
            "bulk DM finished"
        );
        report
    }

    async fn deliver(&self, recipient: &Recipient, text: &str) -> NotificationOutcome {
        match tokio::time::timeout(self.send_timeout, self.port.send_direct(recipient.id, text))
            .await
        {
            Ok(Ok(())) => NotificationOutcome::Delivered,
            Ok(Err(Error::RecipientUnreachable(_))) => NotificationOutcome::Forbidden,
            Ok(Err(e)) => NotificationOutcome::OtherError(e.to_string()),
            Err(_) => NotificationOutcome::OtherError(format!(
                "send timed out after {}ms",
                self.send_timeout.as_millis()
            )),
        }
    }
}

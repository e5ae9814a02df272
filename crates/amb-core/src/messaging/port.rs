use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::{ChannelId, GuildId, MessageRef, Recipient, UserId},
    messaging::types::{Announcement, ChannelInfo, GuildInfo},
    Result,
};

/// Everything the campaign engine needs from the chat platform.
///
/// Lookups return `Ok(None)` when the target does not exist; `Err` is reserved
/// for transport failures.
#[async_trait]
pub trait CommunityPort: Send + Sync {
    async fn guild(&self, guild: GuildId) -> Result<Option<GuildInfo>>;

    async fn channel(&self, guild: GuildId, channel: ChannelId) -> Result<Option<ChannelInfo>>;

    async fn publish(&self, channel: ChannelId, announcement: &Announcement) -> Result<MessageRef>;

    async fn react(&self, msg: MessageRef, emoji: &str) -> Result<()>;

    /// Send a direct message.
    ///
    /// Must return `Error::RecipientUnreachable` when the platform refuses
    /// delivery to this user (DMs closed, blocked).
    async fn send_direct(&self, user: UserId, text: &str) -> Result<()>;

    /// One page of guild members with ids strictly greater than `after`,
    /// ascending. An empty page ends the listing.
    async fn member_page(
        &self,
        guild: GuildId,
        after: Option<UserId>,
        limit: u16,
    ) -> Result<Vec<Recipient>>;

    /// Platform token that renders `at` relative to the reader's clock.
    fn relative_time(&self, at: DateTime<Utc>) -> String {
        at.format("%Y-%m-%d %H:%M UTC").to_string()
    }
}

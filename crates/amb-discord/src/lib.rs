//! Discord adapter (serenity).
//!
//! This crate implements the `amb-core` CommunityPort over the Discord HTTP API
//! and routes slash and prefix commands to the campaign orchestrator.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use serenity::all::{
    ChannelId as DcChannelId, Colour, CreateEmbed, CreateEmbedFooter, CreateMessage,
    GuildId as DcGuildId, Http, MessageId as DcMessageId, ReactionType, UserId as DcUserId,
};

pub mod handlers;
pub mod router;

use amb_core::{
    domain::{ChannelId, GuildId, MessageId, MessageRef, Recipient, UserId},
    errors::Error,
    messaging::{
        port::CommunityPort,
        types::{Accent, Announcement, ChannelInfo, GuildInfo},
    },
    Result,
};

#[derive(Clone)]
pub struct DiscordCommunity {
    http: Arc<Http>,
}

impl DiscordCommunity {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    // Discord ids are non-zero; serenity panics on zero, so reject it up front.
    fn dc_guild(id: GuildId) -> Option<DcGuildId> {
        (id.0 != 0).then(|| DcGuildId::new(id.0))
    }

    fn dc_channel(id: ChannelId) -> Result<DcChannelId> {
        if id.0 == 0 {
            return Err(Error::External("channel id 0 is invalid".to_string()));
        }
        Ok(DcChannelId::new(id.0))
    }

    fn dc_user(id: UserId) -> Result<DcUserId> {
        if id.0 == 0 {
            return Err(Error::External("user id 0 is invalid".to_string()));
        }
        Ok(DcUserId::new(id.0))
    }

    fn status(e: &serenity::Error) -> Option<u16> {
        match e {
            serenity::Error::Http(http_err) => http_err.status_code().map(|s| s.as_u16()),
            _ => None,
        }
    }

    fn map_err(e: serenity::Error) -> Error {
        Error::External(format!("discord error: {e}"))
    }

    /// 404/403 on a lookup means "not there (for us)".
    fn is_missing(e: &serenity::Error) -> bool {
        matches!(Self::status(e), Some(403 | 404))
    }
}

pub(crate) fn colour(accent: Accent) -> Colour {
    match accent {
        Accent::Red => Colour::RED,
        Accent::Orange => Colour::ORANGE,
        Accent::Blue => Colour::BLUE,
    }
}

#[async_trait]
impl CommunityPort for DiscordCommunity {
    async fn guild(&self, guild: GuildId) -> Result<Option<GuildInfo>> {
        let Some(id) = Self::dc_guild(guild) else {
            return Ok(None);
        };
        match id.to_partial_guild(&*self.http).await {
            Ok(g) => Ok(Some(GuildInfo {
                id: guild,
                name: g.name,
            })),
            Err(e) if Self::is_missing(&e) => Ok(None),
            Err(e) => Err(Self::map_err(e)),
        }
    }

    async fn channel(&self, guild: GuildId, channel: ChannelId) -> Result<Option<ChannelInfo>> {
        let Some(gid) = Self::dc_guild(guild) else {
            return Ok(None);
        };
        if channel.0 == 0 {
            return Ok(None);
        }

        let channels = match gid.channels(&*self.http).await {
            Ok(c) => c,
            Err(e) if Self::is_missing(&e) => return Ok(None),
            Err(e) => return Err(Self::map_err(e)),
        };

        Ok(channels
            .get(&DcChannelId::new(channel.0))
            .map(|gc| ChannelInfo {
                id: channel,
                name: gc.name.clone(),
                mention: format!("<#{}>", channel.0),
            }))
    }

    async fn publish(&self, channel: ChannelId, announcement: &Announcement) -> Result<MessageRef> {
        let embed = CreateEmbed::new()
            .title(&announcement.title)
            .description(&announcement.body)
            .colour(colour(announcement.accent))
            .footer(CreateEmbedFooter::new(&announcement.footer));

        let mut builder = CreateMessage::new().embed(embed);
        if announcement.ping_everyone {
            builder = builder.content("||@everyone||");
        }

        let msg = Self::dc_channel(channel)?
            .send_message(&*self.http, builder)
            .await
            .map_err(Self::map_err)?;

        Ok(MessageRef {
            channel_id: channel,
            message_id: MessageId(msg.id.get()),
        })
    }

    async fn react(&self, msg: MessageRef, emoji: &str) -> Result<()> {
        if msg.message_id.0 == 0 {
            return Err(Error::External("message id 0 is invalid".to_string()));
        }
        Self::dc_channel(msg.channel_id)?
            .create_reaction(
                &*self.http,
                DcMessageId::new(msg.message_id.0),
                ReactionType::Unicode(emoji.to_string()),
            )
            .await
            .map_err(Self::map_err)
    }

    async fn send_direct(&self, user: UserId, text: &str) -> Result<()> {
        let res = Self::dc_user(user)?
            .direct_message(&*self.http, CreateMessage::new().content(text))
            .await;

        match res {
            Ok(_) => Ok(()),
            // 50007 "Cannot send messages to this user" arrives as 403.
            Err(e) if Self::status(&e) == Some(403) => {
                Err(Error::RecipientUnreachable(format!("discord refused DM: {e}")))
            }
            Err(e) => Err(Self::map_err(e)),
        }
    }

    async fn member_page(
        &self,
        guild: GuildId,
        after: Option<UserId>,
        limit: u16,
    ) -> Result<Vec<Recipient>> {
        let Some(gid) = Self::dc_guild(guild) else {
            return Err(Error::External("guild id 0 is invalid".to_string()));
        };
        let after = match after {
            Some(u) => Some(Self::dc_user(u)?),
            None => None,
        };

        let members = gid
            .members(&*self.http, Some(u64::from(limit)), after)
            .await
            .map_err(Self::map_err)?;

        Ok(members
            .into_iter()
            .map(|m| Recipient {
                id: UserId(m.user.id.get()),
                display_name: m.user.tag(),
                is_bot: m.user.bot,
            })
            .collect())
    }

    fn relative_time(&self, at: DateTime<Utc>) -> String {
        relative_timestamp(at)
    }
}

/// Discord timestamp markup; each client renders it in its own locale.
pub fn relative_timestamp(at: DateTime<Utc>) -> String {
    format!("<t:{}:R>", at.timestamp())
}

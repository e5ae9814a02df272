//! Fakes shared by the unit tests.

use std::{collections::HashSet, sync::Mutex, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::{ChannelId, GuildId, MessageId, MessageRef, Recipient, UserId},
    errors::Error,
    messaging::{
        port::CommunityPort,
        types::{Announcement, ChannelInfo, GuildInfo},
    },
    notifier::Pacer,
    Result,
};

pub(crate) fn member(id: u64, name: &str, is_bot: bool) -> Recipient {
    Recipient {
        id: UserId(id),
        display_name: name.to_string(),
        is_bot,
    }
}

#[derive(Default)]
pub(crate) struct FakePort {
    pub guild: Option<GuildInfo>,
    pub channels: Vec<ChannelInfo>,
    pub members: Vec<Recipient>,
    pub unreachable: HashSet<UserId>,
    pub broken: HashSet<UserId>,
    pub hang: HashSet<UserId>,
    pub fail_publish: bool,
    pub fail_react: bool,
    pub fail_listing_after: Option<UserId>,

    pub published: Mutex<Vec<(ChannelId, Announcement)>>,
    pub reactions: Mutex<Vec<(MessageRef, String)>>,
    pub dms: Mutex<Vec<(UserId, String)>>,
    pub pages: Mutex<Vec<Option<UserId>>>,
}

impl FakePort {
    pub fn published(&self) -> Vec<(ChannelId, Announcement)> {
        self.published.lock().unwrap().clone()
    }

    pub fn reactions(&self) -> Vec<(MessageRef, String)> {
        self.reactions.lock().unwrap().clone()
    }

    pub fn dm_attempts(&self) -> Vec<UserId> {
        self.dms.lock().unwrap().iter().map(|(u, _)| *u).collect()
    }

    pub fn dm_texts(&self) -> Vec<String> {
        self.dms.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn page_calls(&self) -> Vec<Option<UserId>> {
        self.pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommunityPort for FakePort {
    async fn guild(&self, guild: GuildId) -> Result<Option<GuildInfo>> {
        Ok(self.guild.clone().filter(|g| g.id == guild))
    }

    async fn channel(&self, guild: GuildId, channel: ChannelId) -> Result<Option<ChannelInfo>> {
        if self.guild.as_ref().map(|g| g.id) != Some(guild) {
            return Ok(None);
        }
        Ok(self.channels.iter().find(|c| c.id == channel).cloned())
    }

    async fn publish(&self, channel: ChannelId, announcement: &Announcement) -> Result<MessageRef> {
        if self.fail_publish {
            return Err(Error::External("missing permissions".to_string()));
        }
        let mut published = self.published.lock().unwrap();
        published.push((channel, announcement.clone()));
        Ok(MessageRef {
            channel_id: channel,
            message_id: MessageId(published.len() as u64),
        })
    }

    async fn react(&self, msg: MessageRef, emoji: &str) -> Result<()> {
        if self.fail_react {
            return Err(Error::External("unknown emoji".to_string()));
        }
        self.reactions.lock().unwrap().push((msg, emoji.to_string()));
        Ok(())
    }

    async fn send_direct(&self, user: UserId, text: &str) -> Result<()> {
        self.dms.lock().unwrap().push((user, text.to_string()));
        if self.hang.contains(&user) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.unreachable.contains(&user) {
            return Err(Error::RecipientUnreachable(format!("user {}", user.0)));
        }
        if self.broken.contains(&user) {
            return Err(Error::External("internal server error".to_string()));
        }
        Ok(())
    }

    async fn member_page(
        &self,
        _guild: GuildId,
        after: Option<UserId>,
        limit: u16,
    ) -> Result<Vec<Recipient>> {
        self.pages.lock().unwrap().push(after);
        if after.is_some() && after == self.fail_listing_after {
            return Err(Error::External("gateway hiccup".to_string()));
        }
        let mut members: Vec<Recipient> = self
            .members
            .iter()
            .filter(|m| after.map_or(true, |a| m.id > a))
            .cloned()
            .collect();
        members.sort_by_key(|m| m.id);
        members.truncate(limit as usize);
        Ok(members)
    }

    fn relative_time(&self, at: DateTime<Utc>) -> String {
        format!("<t:{}:R>", at.timestamp())
    }
}

#[derive(Default)]
pub(crate) struct RecordingPacer {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn pauses(&self) -> usize {
        self.delays.lock().unwrap().len()
    }

    pub fn total(&self) -> Duration {
        self.delays.lock().unwrap().iter().sum()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

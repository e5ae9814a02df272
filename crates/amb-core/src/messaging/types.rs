use crate::domain::{ChannelId, GuildId};

/// A resolved guild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: GuildId,
    pub name: String,
}

/// A resolved text channel inside a guild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
    /// Platform syntax that renders as a clickable channel link.
    pub mention: String,
}

/// Embed accent colour. The adapter maps it to a platform colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accent {
    Red,
    Orange,
    Blue,
}

/// A public announcement ready to post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
    pub title: String,
    pub body: String,
    pub footer: String,
    pub accent: Accent,
    pub ping_everyone: bool,
}

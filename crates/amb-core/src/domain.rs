use serde::{Deserialize, Serialize};

/// Discord guild (server) id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(pub u64);

/// Discord channel id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

/// Discord role id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub u64);

/// Discord user id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

/// Discord message id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub u64);

/// A stable reference to a posted message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

/// A guild member as seen by the bulk notifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recipient {
    pub id: UserId,
    pub display_name: String,
    pub is_bot: bool,
}

/// The member who triggered a command.
#[derive(Clone, Debug)]
pub struct Invoker {
    pub id: UserId,
    pub display_name: String,
    pub role_ids: Vec<RoleId>,
}

/// The two campaign types the bot can launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CampaignKind {
    ActivityCheck,
    DeadChat,
}

impl CampaignKind {
    pub fn label(self) -> &'static str {
        match self {
            CampaignKind::ActivityCheck => "activity check",
            CampaignKind::DeadChat => "dead chat",
        }
    }
}

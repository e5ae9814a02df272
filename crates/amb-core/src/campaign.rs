//! Campaign content: titles, bodies, DM text and deadlines.
//!
//! Composition is a pure function of its inputs. The only variable part is the
//! dead-chat conversation prompt, chosen through an injected [`PromptPicker`].

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::{
    domain::CampaignKind,
    messaging::types::{Accent, Announcement},
};

const ACTIVITY_GOAL: &str = "10+";

pub const CONVERSATION_PROMPTS: &[&str] = &[
    "What's the last game you couldn't put down?",
    "Drop your current phone wallpaper and explain yourself.",
    "What's a hot take you'll defend to the end?",
    "Which song has been stuck in your head this week?",
    "What's the best thing you ate recently?",
    "If you could master one skill overnight, what would it be?",
    "Share a screenshot of something that made you laugh today.",
    "What's a show everyone should watch at least once?",
];

pub fn deadline_offset(kind: CampaignKind) -> Duration {
    match kind {
        CampaignKind::ActivityCheck => Duration::days(2),
        CampaignKind::DeadChat => Duration::days(1),
    }
}

/// Acknowledgement reactions attached to the public announcement.
pub fn acknowledgement_reactions(kind: CampaignKind) -> &'static [&'static str] {
    match kind {
        CampaignKind::ActivityCheck => &["\u{2705}"],
        CampaignKind::DeadChat => &[],
    }
}

/// Immutable facts about one launched campaign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CampaignRecord {
    pub campaign_id: u64,
    pub kind: CampaignKind,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

impl CampaignRecord {
    pub fn new(kind: CampaignKind, campaign_id: u64, created_at: DateTime<Utc>) -> Self {
        Self {
            campaign_id,
            kind,
            created_at,
            deadline: created_at + deadline_offset(kind),
        }
    }
}

/// Chooses an index into [`CONVERSATION_PROMPTS`].
pub trait PromptPicker: Send + Sync {
    /// Return an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPicker;

impl PromptPicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always picks the same index (wrapped into range).
#[derive(Clone, Copy, Debug)]
pub struct FixedPicker(pub usize);

impl PromptPicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}

/// Names and platform syntax the templates need.
pub struct ComposeContext<'a> {
    pub server_name: &'a str,
    pub guild_name: &'a str,
    pub channel_mention: &'a str,
    pub invoker: &'a str,
    pub render_deadline: &'a dyn Fn(DateTime<Utc>) -> String,
}

/// Everything needed to publish and fan out one campaign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Campaign {
    pub record: CampaignRecord,
    pub announcement: Announcement,
    pub reactions: Vec<String>,
    pub direct_message: String,
}

pub fn compose(
    kind: CampaignKind,
    campaign_id: u64,
    now: DateTime<Utc>,
    ctx: &ComposeContext<'_>,
    picker: &dyn PromptPicker,
) -> Campaign {
    let record = CampaignRecord::new(kind, campaign_id, now);
    let deadline = (ctx.render_deadline)(record.deadline);

    let (announcement, direct_message) = match kind {
        CampaignKind::ActivityCheck => activity_check(campaign_id, &deadline, ctx),
        CampaignKind::DeadChat => {
            let prompt = CONVERSATION_PROMPTS[picker.pick(CONVERSATION_PROMPTS.len())];
            dead_chat(campaign_id, &deadline, prompt, ctx)
        }
    };

    Campaign {
        record,
        announcement,
        reactions: acknowledgement_reactions(kind)
            .iter()
            .map(|s| s.to_string())
            .collect(),
        direct_message,
    }
}

fn activity_check(id: u64, deadline: &str, ctx: &ComposeContext<'_>) -> (Announcement, String) {
    let server = ctx.server_name;
    let body = format!(
        "## 🕰️ Time Left: {deadline}\n\
## 📈 Goal: {ACTIVITY_GOAL}\n\
## ⁉️ Punishment:\n\
- **Not reacting to this activity check {deadline} will result in you getting either warned, kicked, or even banned for inactivity reasons. Glory to {server}.**"
    );

    let dm = format!(
        "📢 **Activity Check Alert #{id}!**\n\
Please check the activity announcement in {} on **{server}**!\n\
Deadline: {deadline}",
        ctx.channel_mention
    );

    (
        Announcement {
            title: format!("💀 Activity Check #{id}"),
            body,
            footer: format!("Posted by {}", ctx.invoker),
            accent: Accent::Red,
            ping_everyone: true,
        },
        dm,
    )
}

fn dead_chat(
    id: u64,
    deadline: &str,
    prompt: &str,
    ctx: &ComposeContext<'_>,
) -> (Announcement, String) {
    let body = format!(
        "## 🔔 {deadline} until activity review\n\
### Hey everyone, let's bring this chat back to life!\n\n\
📣 **Why be active?**\n\
- Level up with roles\n\
- Special permissions & events\n\
- Recognition from staff\n\n\
📝 Stay active or risk being marked as inactive.\n\
Let's revive the server, your next message could help spark it! 💬\n\n\
💡 **Conversation starter:** {prompt}"
    );

    let dm = format!(
        "👋 Hey there!\n\n\
Our chat in **{}** is feeling a bit quiet.\n\
Now's your chance to shine: talk, hang out, and get perks for activity!\n\
You might unlock special roles, event access, or even mod favor.\n\n\
Join us in {} and make some noise! 🗣️\n\
Review: {deadline}",
        ctx.guild_name, ctx.channel_mention
    );

    (
        Announcement {
            title: format!("☠️ Dead Chat Alert #{id}!"),
            body,
            footer: format!("Initiated by {}", ctx.invoker),
            accent: Accent::Orange,
            ping_everyone: true,
        },
        dm,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn unix_token(at: DateTime<Utc>) -> String {
        format!("<t:{}:R>", at.timestamp())
    }

    fn ctx<'a>(render: &'a dyn Fn(DateTime<Utc>) -> String) -> ComposeContext<'a> {
        ComposeContext {
            server_name: "Reapers",
            guild_name: "Reapers HQ",
            channel_mention: "<#20>",
            invoker: "mod#0001",
            render_deadline: render,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn deadline_offsets_per_kind() {
        let render = unix_token;
        for id in [1, 42, 9_999] {
            let a = compose(CampaignKind::ActivityCheck, id, now(), &ctx(&render), &FixedPicker(0));
            assert_eq!(a.record.deadline, now() + Duration::days(2));
            assert_eq!(a.record.campaign_id, id);

            let d = compose(CampaignKind::DeadChat, id, now(), &ctx(&render), &FixedPicker(0));
            assert_eq!(d.record.deadline, now() + Duration::days(1));
        }
    }

    #[test]
    fn activity_check_embeds_number_and_deadline_token() {
        let render = unix_token;
        let c = compose(CampaignKind::ActivityCheck, 7, now(), &ctx(&render), &FixedPicker(3));
        let token = unix_token(now() + Duration::days(2));

        assert_eq!(c.announcement.title, "💀 Activity Check #7");
        assert!(c.announcement.body.contains(&token));
        assert!(c.announcement.body.contains("Glory to Reapers."));
        assert_eq!(c.announcement.footer, "Posted by mod#0001");
        assert_eq!(c.announcement.accent, Accent::Red);
        assert!(c.direct_message.contains("#7"));
        assert!(c.direct_message.contains("<#20>"));
        assert!(c.direct_message.contains(&token));
        assert_eq!(c.reactions, vec!["\u{2705}".to_string()]);
    }

    #[test]
    fn activity_check_ignores_picker() {
        let render = unix_token;
        let a = compose(CampaignKind::ActivityCheck, 1, now(), &ctx(&render), &FixedPicker(0));
        let b = compose(CampaignKind::ActivityCheck, 1, now(), &ctx(&render), &FixedPicker(5));
        assert_eq!(a, b);
    }

    #[test]
    fn dead_chat_uses_picked_prompt() {
        let render = unix_token;
        let c = compose(CampaignKind::DeadChat, 2, now(), &ctx(&render), &FixedPicker(1));
        assert!(c.announcement.body.contains(CONVERSATION_PROMPTS[1]));
        assert!(c.direct_message.contains("Reapers HQ"));
        assert!(c.reactions.is_empty());
        assert_eq!(c.announcement.accent, Accent::Orange);

        let wrapped = compose(
            CampaignKind::DeadChat,
            2,
            now(),
            &ctx(&render),
            &FixedPicker(CONVERSATION_PROMPTS.len() + 1),
        );
        assert_eq!(c, wrapped);
    }

    #[test]
    fn random_picker_stays_in_range() {
        let p = RandomPicker;
        for _ in 0..100 {
            assert!(p.pick(CONVERSATION_PROMPTS.len()) < CONVERSATION_PROMPTS.len());
        }
    }
}

//! Command surface shared by the slash and prefix entry points.

use crate::domain::CampaignKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Help,
    Launch(CampaignKind),
}

impl CommandKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "help" => Some(CommandKind::Help),
            "activity" => Some(CommandKind::Launch(CampaignKind::ActivityCheck)),
            "deadchat" => Some(CommandKind::Launch(CampaignKind::DeadChat)),
            _ => None,
        }
    }
}

/// Slash command definitions: (name, description).
pub const SLASH_COMMANDS: &[(&str, &str)] = &[
    ("help", "Displays all available commands."),
    ("activity", "Sends an activity check message and DMs members."),
    (
        "deadchat",
        "Pings the dead chat and DMs members to encourage activity.",
    ),
];

/// Parse a prefix invocation such as `!activity` or `!Help extra words`.
///
/// The command name must follow the prefix directly (`! activity` is ignored).
/// Returns `None` for messages that do not start with `prefix` or name an
/// unknown command.
pub fn parse_prefix_command(text: &str, prefix: &str) -> Option<CommandKind> {
    if prefix.is_empty() {
        return None;
    }
    let rest = text.trim_start().strip_prefix(prefix)?;
    if rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = rest.split_whitespace().next()?;
    CommandKind::from_name(name)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HelpEntry {
    pub name: String,
    pub description: &'static str,
}

pub const HELP_TITLE: &str = "📜 Activity Manager Bot Commands";
pub const HELP_DESCRIPTION: &str =
    "Here are all the commands you can use with the Activity Manager Bot! 🎉";

/// Help listing covering both invocation styles.
pub fn help_entries(prefix: &str) -> Vec<HelpEntry> {
    let rows: [(&str, &str, &'static str); 3] = [
        ("📋", "help", "Shows this help message"),
        ("📢", "activity", "Launch an activity check"),
        ("☠️", "deadchat", "Ping and DM for dead chat revival"),
    ];

    let mut out = Vec::with_capacity(rows.len() * 2);
    for (icon, name, description) in rows {
        out.push(HelpEntry {
            name: format!("{icon} /{name}"),
            description,
        });
        out.push(HelpEntry {
            name: format!("{icon} {prefix}{name}"),
            description,
        });
    }
    out
}

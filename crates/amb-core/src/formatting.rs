//! Reply text for the invoker (Discord markdown).

use crate::{domain::CampaignKind, orchestrator::LaunchReport};

/// Discord's hard limit for a plain message.
pub const MESSAGE_LIMIT: usize = 2000;

/// Escape Discord markdown control characters so user names render literally.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '_' | '~' | '`' | '|' | '>') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Private confirmation sent back to whoever launched the campaign.
pub fn launch_success_notice(kind: CampaignKind, report: &LaunchReport, limit: usize) -> String {
    let id = report.campaign.campaign_id;
    let mut out = match kind {
        CampaignKind::ActivityCheck => format!("✅ Activity check #{id} posted and DMs sent!"),
        CampaignKind::DeadChat => format!("📣 Dead chat ping #{id} sent and DMs delivered!"),
    };

    let failures = &report.failures;
    let mut notes = Vec::new();
    if failures.errored > 0 {
        notes.push(format!(
            "⚠️ {} DM(s) failed for other reasons (see logs).",
            failures.errored
        ));
    }
    if failures.truncated {
        notes.push(
            "⚠️ Member listing stopped early; some members were not contacted.".to_string(),
        );
    }
    if failures.cancelled {
        notes.push("⚠️ The DM run was cancelled before it finished.".to_string());
    }
    for n in &notes {
        out.push('\n');
        out.push_str(n);
    }

    if !failures.failed.is_empty() {
        let names: Vec<String> = failures
            .failed_names()
            .into_iter()
            .map(escape_markdown)
            .collect();
        let budget = limit.saturating_sub(out.len());
        out.push_str(&failed_list_line(&names, budget));
    }

    out
}

/// `\n⚠️ Failed to DM: a, b, c` trimmed to `budget` bytes with an "and N more" tail.
fn failed_list_line(names: &[String], budget: usize) -> String {
    const HEAD: &str = "\n⚠️ Failed to DM: ";

    let full = format!("{HEAD}{}", names.join(", "));
    if full.len() <= budget {
        return full;
    }

    let mut line = HEAD.to_string();
    for (i, name) in names.iter().enumerate() {
        let remaining = names.len() - i;
        let sep = if i == 0 { "" } else { ", " };
        let tail_if_stop = format!("{sep}… and {remaining} more");
        let tail_after = format!(", … and {} more", remaining - 1);

        let fits = line.len() + sep.len() + name.len() + tail_after.len() <= budget;
        if !fits {
            if line.len() + tail_if_stop.len() <= budget {
                line.push_str(&tail_if_stop);
                return line;
            }
            return String::new();
        }
        line.push_str(sep);
        line.push_str(name);
    }
    line
}

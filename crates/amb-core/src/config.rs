use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::warn;

use crate::{
    domain::{CampaignKind, ChannelId, GuildId, RoleId},
    errors::Error,
    Result,
};

const DEFAULT_CONFIG_FILE: &str = "config.json";
const DEFAULT_COUNTER_FILE: &str = "activity_data.json";
const MAX_MEMBER_PAGE: u16 = 1000;

/// Server-specific settings read from `config.json`.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerFile {
    pub server_name: String,
    pub server_id: GuildId,
    pub activity_channel_id: ChannelId,
    pub dead_chat_channel_id: ChannelId,
    #[serde(default)]
    pub allowed_roles: Vec<RoleId>,
}

/// Typed, immutable configuration built once at startup.
#[derive(Clone)]
pub struct Config {
    // Server
    pub server_name: String,
    pub server_id: GuildId,
    pub activity_channel_id: ChannelId,
    pub dead_chat_channel_id: ChannelId,
    pub allowed_roles: Vec<RoleId>,

    // Discord
    pub discord_token: String,
    pub command_prefix: String,

    // Storage
    pub counter_file: PathBuf,

    // Bulk DM pacing
    pub dm_delay: Duration,
    pub dm_timeout: Duration,
    pub member_page_size: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let discord_token = resolve_token(env_str("DISCORD_TOKEN"), env_str("TOKEN"))?;

        let config_path = env_path("CONFIG_FILE").unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());
        let server = read_server_file(&config_path)?;

        let cfg = Self::from_parts(
            server,
            discord_token,
            EnvOverrides {
                counter_file: env_path("COUNTER_FILE"),
                command_prefix: env_str("COMMAND_PREFIX").and_then(non_empty),
                dm_delay_ms: env_u64("DM_DELAY_MS"),
                dm_timeout_ms: env_u64("DM_TIMEOUT_MS"),
                member_page_size: env_u64("MEMBER_PAGE_SIZE"),
            },
        );

        if cfg.allowed_roles.is_empty() {
            warn!(
                config = %config_path.display(),
                "allowed_roles is empty; every privileged command will be denied"
            );
        }

        Ok(cfg)
    }

    fn from_parts(server: ServerFile, discord_token: String, overrides: EnvOverrides) -> Self {
        let member_page_size = overrides
            .member_page_size
            .unwrap_or(MAX_MEMBER_PAGE as u64)
            .clamp(1, MAX_MEMBER_PAGE as u64) as u16;

        Self {
            server_name: server.server_name,
            server_id: server.server_id,
            activity_channel_id: server.activity_channel_id,
            dead_chat_channel_id: server.dead_chat_channel_id,
            allowed_roles: server.allowed_roles,
            discord_token,
            command_prefix: overrides.command_prefix.unwrap_or_else(|| "!".to_string()),
            counter_file: overrides
                .counter_file
                .unwrap_or_else(|| DEFAULT_COUNTER_FILE.into()),
            dm_delay: Duration::from_millis(overrides.dm_delay_ms.unwrap_or(1000)),
            dm_timeout: Duration::from_millis(overrides.dm_timeout_ms.unwrap_or(10_000)),
            member_page_size,
        }
    }

    /// Announcement channel configured for a campaign kind.
    pub fn channel_for(&self, kind: CampaignKind) -> ChannelId {
        match kind {
            CampaignKind::ActivityCheck => self.activity_channel_id,
            CampaignKind::DeadChat => self.dead_chat_channel_id,
        }
    }
}

// The token must never reach the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_name", &self.server_name)
            .field("server_id", &self.server_id)
            .field("activity_channel_id", &self.activity_channel_id)
            .field("dead_chat_channel_id", &self.dead_chat_channel_id)
            .field("allowed_roles", &self.allowed_roles)
            .field("discord_token", &"<redacted>")
            .field("command_prefix", &self.command_prefix)
            .field("counter_file", &self.counter_file)
            .field("dm_delay", &self.dm_delay)
            .field("dm_timeout", &self.dm_timeout)
            .field("member_page_size", &self.member_page_size)
            .finish()
    }
}

#[derive(Debug, Default)]
struct EnvOverrides {
    counter_file: Option<PathBuf>,
    command_prefix: Option<String>,
    dm_delay_ms: Option<u64>,
    dm_timeout_ms: Option<u64>,
    member_page_size: Option<u64>,
}

pub fn read_server_file(path: &Path) -> Result<ServerFile> {
    let txt = fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("cannot read config file {}: {e}", path.display()))
    })?;
    parse_server_file(&txt)
        .map_err(|e| Error::Config(format!("invalid config file {}: {e}", path.display())))
}

fn parse_server_file(txt: &str) -> std::result::Result<ServerFile, serde_json::Error> {
    serde_json::from_str(txt)
}

/// `DISCORD_TOKEN` wins; the legacy `TOKEN` is used when it is unset or blank.
fn resolve_token(discord_token: Option<String>, legacy_token: Option<String>) -> Result<String> {
    discord_token
        .and_then(non_empty)
        .or_else(|| legacy_token.and_then(non_empty))
        .ok_or_else(|| Error::Config("DISCORD_TOKEN environment variable is required".to_string()))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
pub(crate) fn test_config(counter_file: PathBuf) -> Config {
    Config {
        server_name: "Test Realm".to_string(),
        server_id: GuildId(10),
        activity_channel_id: ChannelId(20),
        dead_chat_channel_id: ChannelId(30),
        allowed_roles: vec![RoleId(100)],
        discord_token: "secret-token".to_string(),
        command_prefix: "!".to_string(),
        counter_file,
        dm_delay: Duration::from_millis(0),
        dm_timeout: Duration::from_secs(1),
        member_page_size: 2,
    }
}

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, policy::MAX_DELAY_SECONDS, Result};

/// Typed configuration, read from the environment (and `.env` if present).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    // Policy defaults for chats that were never configured.
    pub default_delete_delay: u32,

    // Welcome menu links
    pub owner_url: Option<String>,
    pub channel_url: Option<String>,

    // Startup
    pub drop_pending_updates: bool,

    // Audit
    pub audit_log_path: Option<PathBuf>,
    pub audit_log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| get("TELEGRAM_BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("BOT_TOKEN environment variable is required".to_string())
            })?;

        let default_delete_delay = parse_u32(get("DEFAULT_DELETE_DELAY"))
            .unwrap_or(crate::policy::DEFAULT_DELAY_SECONDS)
            .min(MAX_DELAY_SECONDS);

        let owner_url = get("OWNER_URL").and_then(non_empty);
        let channel_url = get("CHANNEL_URL").and_then(non_empty);

        let drop_pending_updates = parse_bool(get("DROP_PENDING_UPDATES")).unwrap_or(true);

        let audit_log_path = get("AUDIT_LOG_PATH").and_then(non_empty).map(PathBuf::from);
        let audit_log_json = parse_bool(get("AUDIT_LOG_JSON")).unwrap_or(true);

        Ok(Self {
            telegram_bot_token,
            default_delete_delay,
            owner_url,
            channel_url,
            drop_pending_updates,
            audit_log_path,
            audit_log_json,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
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

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_u32(v: Option<String>) -> Option<u32> {
    v.and_then(|s| s.trim().parse::<u32>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

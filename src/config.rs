use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::state::session::KNOWN_PERSONALITIES;
use crate::types::Mode;
use crate::util::{is_local_endpoint_url, parse_bool_flag};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_PERSONALITY: &str = "friendly";
pub const DEFAULT_ANALYZE_LANGUAGE: &str = "auto";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server_url: String,
    pub personality: String,
    pub mode: Mode,
    pub code_mode: bool,
    pub analyze_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            personality: DEFAULT_PERSONALITY.to_string(),
            mode: Mode::Chat,
            code_mode: false,
            analyze_language: DEFAULT_ANALYZE_LANGUAGE.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let server_url = non_empty_env("BOTPANE_SERVER_URL").unwrap_or(defaults.server_url);
        let personality = non_empty_env("BOTPANE_PERSONALITY")
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or(defaults.personality);
        let mode = match non_empty_env("BOTPANE_MODE") {
            Some(raw) => raw
                .parse::<Mode>()
                .map_err(anyhow::Error::msg)
                .context("invalid BOTPANE_MODE")?,
            None => defaults.mode,
        };
        let code_mode = match non_empty_env("BOTPANE_CODE_MODE") {
            Some(raw) => match parse_bool_flag(&raw) {
                Some(flag) => flag,
                None => bail!("invalid BOTPANE_CODE_MODE '{raw}': expected a boolean flag"),
            },
            None => defaults.code_mode,
        };
        let analyze_language =
            non_empty_env("BOTPANE_ANALYZE_LANGUAGE").unwrap_or(defaults.analyze_language);

        Ok(Self {
            server_url,
            personality,
            mode,
            code_mode,
            analyze_language,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.server_url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!(
                "Invalid BOTPANE_SERVER_URL '{}': expected http:// or https:// URL",
                self.server_url
            );
        }

        if url.starts_with("http://") && !self.is_local_endpoint() {
            tracing::warn!(
                server_url = %self.server_url,
                "chat traffic to a remote server is not encrypted"
            );
        }

        if !KNOWN_PERSONALITIES.contains(&self.personality.as_str()) {
            tracing::warn!(
                personality = %self.personality,
                "unknown personality tag; the server falls back to its default"
            );
        }

        if self.analyze_language.trim().is_empty() {
            bail!("BOTPANE_ANALYZE_LANGUAGE must not be blank");
        }

        Ok(())
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.server_url)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 5] = [
        "BOTPANE_SERVER_URL",
        "BOTPANE_PERSONALITY",
        "BOTPANE_MODE",
        "BOTPANE_CODE_MODE",
        "BOTPANE_ANALYZE_LANGUAGE",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_without_env() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        clear_env();
        let config = Config::load().expect("load defaults");
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.personality, "friendly");
        assert_eq!(config.mode, Mode::Chat);
        assert!(!config.code_mode);
        assert_eq!(config.analyze_language, "auto");
    }

    #[test]
    fn load_reads_env_overrides() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        clear_env();
        std::env::set_var("BOTPANE_SERVER_URL", "https://bots.example.com");
        std::env::set_var("BOTPANE_PERSONALITY", "Quirky");
        std::env::set_var("BOTPANE_MODE", "debug");
        std::env::set_var("BOTPANE_CODE_MODE", "on");

        let config = Config::load().expect("load overrides");
        assert_eq!(config.server_url, "https://bots.example.com");
        assert_eq!(config.personality, "quirky");
        assert_eq!(config.mode, Mode::Debug);
        assert!(config.code_mode);
        clear_env();
    }

    #[test]
    fn load_rejects_bad_mode_and_flag() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        clear_env();
        std::env::set_var("BOTPANE_MODE", "loud");
        assert!(Config::load().is_err());
        clear_env();
        std::env::set_var("BOTPANE_CODE_MODE", "maybe");
        assert!(Config::load().is_err());
        clear_env();
    }
}

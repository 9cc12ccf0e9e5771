use serde::Deserialize;
use std::{fs, path::Path};

use crate::infrastructure::markup::DEFAULT_PLAUSIBILITY_FLOOR;
use crate::infrastructure::notify::telegram::DEFAULT_API_BASE;
use crate::shared::errors::ConfigError;

pub const DEFAULT_SERVER_URL: &str = "http://93.118.110.114:8080";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceCfg {
    pub base_url: String,
    /// Page scraped by the markup path; defaults to `base_url`
    pub page_url: Option<String>,
    pub socket_path: String,
    pub event_name: String,
    /// Event emitted after connecting; empty disables it
    pub request_event: String,
    pub preferred_timeframe: Option<String>,
    pub max_polls: u32,
    pub poll_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for SourceCfg {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            page_url: None,
            socket_path: "/socket.io/".to_string(),
            event_name: "update_all".to_string(),
            request_event: "request_initial_data".to_string(),
            preferred_timeframe: None,
            max_polls: 5,
            poll_delay_ms: 200,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkupCfg {
    /// Lowest base price the page-wide pattern search accepts
    pub plausibility_floor: f64,
    /// Headless Chromium-compatible binary; unset disables rendering
    pub renderer_binary: Option<String>,
    pub render_timeout_secs: u64,
}

impl Default for MarkupCfg {
    fn default() -> Self {
        Self {
            plausibility_floor: DEFAULT_PLAUSIBILITY_FLOOR,
            renderer_binary: None,
            render_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramCfg {
    pub api_base: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl Default for TelegramCfg {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: None,
            chat_id: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceCfg,
    pub markup: MarkupCfg,
    pub telegram: TelegramCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        Ok(cfg)
    }

    /// Overlay values from the environment (credentials, endpoint, timeframe)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(token) = get("TELEGRAM_TOKEN").or_else(|| get("TELEGRAM_BOT_TOKEN")) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = get("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(url) = get("PREDICTION_SERVER_URL") {
            self.source.base_url = url;
        }
        if let Some(tf) = get("KRONOS_TIMEFRAME") {
            self.source.preferred_timeframe = Some(tf);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, url) in [("source.base_url", Some(&self.source.base_url)), ("source.page_url", self.source.page_url.as_ref())] {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::Invalid {
                        field,
                        reason: format!("'{}' is not an http(s) URL", url),
                    });
                }
            }
        }
        if self.source.max_polls == 0 {
            return Err(ConfigError::Invalid {
                field: "source.max_polls",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.source.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "source.request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.markup.plausibility_floor.is_finite() || self.markup.plausibility_floor < 0.0 {
            return Err(ConfigError::Invalid {
                field: "markup.plausibility_floor",
                reason: "must be a non-negative number".to_string(),
            });
        }
        Ok(())
    }

    pub fn page_url(&self) -> &str {
        self.source.page_url.as_deref().unwrap_or(&self.source.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.source.base_url, DEFAULT_SERVER_URL);
        assert_eq!(cfg.source.max_polls, 5);
        assert_eq!(cfg.source.poll_delay_ms, 200);
        assert_eq!(cfg.markup.plausibility_floor, 1000.0);
        assert_eq!(cfg.page_url(), DEFAULT_SERVER_URL);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let cfg = Config::from_toml(
            r#"
            [source]
            base_url = "https://kronos.example"
            preferred_timeframe = "M15"
            request_event = ""

            [markup]
            plausibility_floor = 50.0
            renderer_binary = "chromium"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.source.base_url, "https://kronos.example");
        assert_eq!(cfg.source.preferred_timeframe.as_deref(), Some("M15"));
        assert_eq!(cfg.source.request_event, "");
        assert_eq!(cfg.source.event_name, "update_all");
        assert_eq!(cfg.markup.plausibility_floor, 50.0);
        assert_eq!(cfg.markup.renderer_binary.as_deref(), Some("chromium"));
        assert_eq!(cfg.telegram.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut cfg = Config::from_toml("[telegram]\nbot_token = \"file-token\"\nchat_id = \"1\"").unwrap();
        let env: HashMap<&str, &str> = [("TELEGRAM_BOT_TOKEN", "env-token"), ("TELEGRAM_CHAT_ID", " "), ("KRONOS_TIMEFRAME", "H4")]
            .into_iter()
            .collect();
        cfg.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(cfg.telegram.bot_token.as_deref(), Some("env-token"));
        // blank values are ignored
        assert_eq!(cfg.telegram.chat_id.as_deref(), Some("1"));
        assert_eq!(cfg.source.preferred_timeframe.as_deref(), Some("H4"));
    }

    #[test]
    fn test_validation() {
        let mut cfg = Config::default();
        cfg.source.page_url = Some("ftp://nope".to_string());
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid { field: "source.page_url", .. })));

        let mut cfg = Config::default();
        cfg.source.max_polls = 0;
        assert!(cfg.validate().is_err());

        assert!(Config::from_toml("[source]\nmax_polls = \"many\"").is_err());
    }
}

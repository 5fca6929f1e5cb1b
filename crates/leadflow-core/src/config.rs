//! Leadflow configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LeadflowError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadflowConfig {
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    #[serde(default)]
    pub geo: GeoConfig,
}

impl LeadflowConfig {
    /// Load config from the default path (~/.leadflow/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LeadflowError::Config(format!("Failed to read config: {e}")))?;
        Self::parse(&content)
    }

    /// Parse config from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| LeadflowError::Config(format!("Failed to parse config: {e}")))
    }

    /// Render the config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| LeadflowError::Config(format!("Failed to serialize config: {e}")))
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Leadflow home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".leadflow")
    }
}

/// Notification buffer and alert thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Ad-hoc notifications kept, newest first.
    #[serde(default = "default_max_recent")]
    pub max_recent: usize,
    /// Seconds after which an unread ad-hoc notification is marked read.
    #[serde(default = "default_auto_read_secs")]
    pub auto_read_secs: u64,
    /// Leads inactive for more than this many days raise a warning.
    #[serde(default = "default_inactivity_days")]
    pub inactivity_days: u32,
    /// Active reps below this fraction of their sales target raise an error alert.
    #[serde(default = "default_rep_risk_ratio")]
    pub rep_risk_ratio: f64,
}

fn default_max_recent() -> usize { 10 }
fn default_auto_read_secs() -> u64 { 5 }
fn default_inactivity_days() -> u32 { 10 }
fn default_rep_risk_ratio() -> f64 { 0.5 }

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_recent: default_max_recent(),
            auto_read_secs: default_auto_read_secs(),
            inactivity_days: default_inactivity_days(),
            rep_risk_ratio: default_rep_risk_ratio(),
        }
    }
}

/// Pipeline behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stored when a loss is confirmed with a blank reason.
    #[serde(default = "default_loss_reason")]
    pub default_loss_reason: String,
    /// Actor name written into activity entries.
    #[serde(default = "default_actor")]
    pub actor: String,
}

fn default_loss_reason() -> String { "not informed".into() }
fn default_actor() -> String { "system".into() }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_loss_reason: default_loss_reason(),
            actor: default_actor(),
        }
    }
}

/// Job dispatcher settings. Manual execution is the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub dispatcher_enabled: bool,
    #[serde(default = "default_dispatch_interval")]
    pub dispatch_interval_secs: u64,
}

fn default_dispatch_interval() -> u64 { 30 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            dispatcher_enabled: false,
            dispatch_interval_secs: default_dispatch_interval(),
        }
    }
}

/// Outbound channel transports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

fn bool_true() -> bool { true }

/// Geocoding lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    #[serde(default = "default_geo_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geo_timeout")]
    pub timeout_secs: u64,
}

fn default_geo_url() -> String { "https://nominatim.openstreetmap.org/search".into() }
fn default_user_agent() -> String { format!("leadflow/{}", env!("CARGO_PKG_VERSION")) }
fn default_geo_timeout() -> u64 { 10 }

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            base_url: default_geo_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geo_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = LeadflowConfig::default();
        assert_eq!(cfg.notifications.max_recent, 10);
        assert_eq!(cfg.notifications.auto_read_secs, 5);
        assert_eq!(cfg.notifications.inactivity_days, 10);
        assert_eq!(cfg.pipeline.default_loss_reason, "not informed");
        assert!(!cfg.scheduler.dispatcher_enabled);
        assert!(cfg.channels.webhook.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let cfg = LeadflowConfig::parse(
            r#"
            [notifications]
            max_recent = 3

            [channels.webhook]
            url = "https://hooks.example.com/outreach"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.notifications.max_recent, 3);
        assert_eq!(cfg.notifications.auto_read_secs, 5);
        let wh = cfg.channels.webhook.unwrap();
        assert!(wh.enabled);
        assert!(wh.headers.is_empty());
    }

    #[test]
    fn test_invalid_toml() {
        let err = LeadflowConfig::parse("notifications = 5").unwrap_err();
        assert!(matches!(err, LeadflowError::Config(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let text = LeadflowConfig::default().to_toml().unwrap();
        let back = LeadflowConfig::parse(&text).unwrap();
        assert_eq!(back.scheduler.dispatch_interval_secs, 30);
    }
}

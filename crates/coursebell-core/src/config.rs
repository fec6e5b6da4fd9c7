//! CourseBell configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseBellConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl Default for CourseBellConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            channel: ChannelConfig::default(),
        }
    }
}

impl CourseBellConfig {
    /// Load config from the default path (~/.coursebell/config.toml).
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
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::CourseBellError::Config(format!("Failed to read config: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::CourseBellError::Config(format!("Failed to parse config: {e}"))
        })?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::error::CourseBellError::Config(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the CourseBell home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".coursebell")
    }
}

/// Scheduler timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between due-trigger checks.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Hours an unconfirmed draft survives before cleanup.
    #[serde(default = "default_draft_cleanup")]
    pub draft_cleanup_hours: i64,
    /// Hours a soft-deleted event can still be undone before it is purged.
    #[serde(default = "default_deleted_cleanup")]
    pub deleted_event_cleanup_hours: i64,
    /// Trigger database path. Empty = ~/.coursebell/triggers.db.
    #[serde(default)]
    pub db_path: String,
}

fn default_tick_interval() -> u64 {
    15
}
fn default_draft_cleanup() -> i64 {
    24
}
fn default_deleted_cleanup() -> i64 {
    24
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            draft_cleanup_hours: default_draft_cleanup(),
            deleted_event_cleanup_hours: default_deleted_cleanup(),
            db_path: String::new(),
        }
    }
}

impl SchedulerConfig {
    pub fn db_path(&self) -> PathBuf {
        if self.db_path.is_empty() {
            CourseBellConfig::home_dir().join("triggers.db")
        } else {
            PathBuf::from(&self.db_path)
        }
    }

    pub fn draft_cleanup_delay(&self) -> chrono::Duration {
        chrono::Duration::hours(self.draft_cleanup_hours)
    }

    pub fn deleted_event_cleanup_delay(&self) -> chrono::Duration {
        chrono::Duration::hours(self.deleted_event_cleanup_hours)
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub discord: Option<DiscordConfig>,
}

/// Discord bot credentials for outbound notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CourseBellConfig::default();
        assert_eq!(config.scheduler.tick_interval_secs, 15);
        assert_eq!(config.scheduler.draft_cleanup_hours, 24);
        assert!(config.channel.discord.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: CourseBellConfig = toml::from_str(
            r#"
            [scheduler]
            draft_cleanup_hours = 48

            [channel.discord]
            bot_token = "token-123"
            "#,
        )
        .unwrap();
        assert_eq!(config.scheduler.draft_cleanup_hours, 48);
        // Unset fields fall back to defaults
        assert_eq!(config.scheduler.tick_interval_secs, 15);
        let discord = config.channel.discord.unwrap();
        assert_eq!(discord.bot_token, "token-123");
        assert!(discord.enabled);
    }
}

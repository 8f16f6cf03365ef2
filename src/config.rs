//! Versioned plugin configuration.
//!
//! Stored as JSON with human-readable keys. When a file written by an older
//! version is loaded, fields introduced since that version are reset to
//! their defaults and the file is rewritten.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "quarrylock";
const CONFIG_FILE: &str = "config.json";

/// Version of the running plugin, written back into migrated files.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Files older than this carry nothing worth keeping.
const RESET_BEFORE: ConfigVersion = ConfigVersion(1, 0, 0);

/// Owner-only placement, static gating and friends authorization arrived here.
const GATING_POLICY_SINCE: ConfigVersion = ConfigVersion(2, 1, 0);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Files without a version predate versioning and are treated as 0.0.0.
    #[serde(rename = "Version", default = "unversioned")]
    pub version: String,

    #[serde(rename = "Enable Auto Locking On Placement")]
    pub auto_lock_on_placement: bool,

    #[serde(rename = "Only Owner Can Place Locks")]
    pub owner_only_placement: bool,

    #[serde(rename = "Allow Locking Static Extractors")]
    pub allow_static_gating: bool,

    #[serde(rename = "Auto Authorize Team")]
    pub auto_authorize_team: bool,

    #[serde(rename = "Auto Authorize Clan")]
    pub auto_authorize_clan: bool,

    #[serde(rename = "Auto Authorize Friends")]
    pub auto_authorize_friends: bool,

    /// Pause between gates during restart reconciliation.
    #[serde(rename = "Reconcile Delay Millis")]
    pub reconcile_delay_ms: u64,
}

fn unversioned() -> String {
    "0.0.0".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION.to_string(),
            auto_lock_on_placement: false,
            owner_only_placement: false,
            allow_static_gating: true,
            auto_authorize_team: true,
            auto_authorize_clan: false,
            auto_authorize_friends: false,
            reconcile_delay_ms: 100,
        }
    }
}

impl Config {
    pub fn reconcile_delay(&self) -> Duration {
        Duration::from_millis(self.reconcile_delay_ms)
    }

    /// Load configuration from the user's config directory.
    pub fn load_default() -> Result<Self> {
        Self::load(&get_config_path()?)
    }

    /// Load, migrate and save configuration at `path`.
    /// A missing file produces defaults, which are written out.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&content).context("Failed to parse config file")?
        } else {
            tracing::info!("No config at {}, writing defaults", path.display());
            Self::default()
        };

        config.migrate();
        config.save(path)?;
        Ok(config)
    }

    /// Save the configuration to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Bring a config written by an older version up to date.
    /// Returns `true` if anything changed.
    pub fn migrate(&mut self) -> bool {
        let stored = ConfigVersion::parse(&self.version);
        let current = ConfigVersion::parse(CURRENT_VERSION);
        if stored >= current {
            return false;
        }

        tracing::warn!("Config changes detected! Updating...");
        let previous = std::mem::take(&mut self.version);
        let defaults = Self::default();

        if stored < RESET_BEFORE {
            *self = defaults.clone();
        } else if stored < GATING_POLICY_SINCE {
            self.owner_only_placement = defaults.owner_only_placement;
            self.allow_static_gating = defaults.allow_static_gating;
            self.auto_authorize_friends = defaults.auto_authorize_friends;
        }

        tracing::warn!(
            "Config update complete! Updated from version {} to {}",
            previous,
            CURRENT_VERSION
        );
        self.version = CURRENT_VERSION.to_string();
        true
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

/// `major.minor.patch`, compared numerically. Unparseable parts read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ConfigVersion(u32, u32, u32);

impl ConfigVersion {
    fn parse(s: &str) -> Self {
        let mut parts = s
            .trim()
            .split('.')
            .map(|p| p.parse::<u32>().unwrap_or(0));
        Self(
            parts.next().unwrap_or(0),
            parts.next().unwrap_or(0),
            parts.next().unwrap_or(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn versions_compare_numerically() {
        assert!(ConfigVersion::parse("1.10.0") > ConfigVersion::parse("1.9.0"));
        assert_eq!(ConfigVersion::parse("garbage"), ConfigVersion(0, 0, 0));
        assert_eq!(ConfigVersion::parse("2.1"), ConfigVersion(2, 1, 0));
    }

    #[test]
    fn current_config_is_untouched() {
        let mut config = Config {
            auto_lock_on_placement: true,
            ..Config::default()
        };
        assert!(!config.migrate());
        assert!(config.auto_lock_on_placement);
    }

    #[test]
    fn pre_1_0_config_resets_to_defaults() {
        let mut config = Config {
            version: "0.9.0".to_string(),
            auto_lock_on_placement: true,
            auto_authorize_team: false,
            ..Config::default()
        };
        assert!(config.migrate());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn pre_2_1_config_keeps_old_fields_and_defaults_new_ones() {
        let mut config = Config {
            version: "2.0.0".to_string(),
            auto_lock_on_placement: true,
            auto_authorize_clan: true,
            owner_only_placement: true,
            allow_static_gating: false,
            auto_authorize_friends: true,
            ..Config::default()
        };
        config.migrate();

        assert_eq!(config.version, CURRENT_VERSION);
        assert!(config.auto_lock_on_placement);
        assert!(config.auto_authorize_clan);
        assert!(!config.owner_only_placement);
        assert!(config.allow_static_gating);
        assert!(!config.auto_authorize_friends);
    }

    #[test]
    fn load_writes_defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config::load(&path).unwrap();

        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn load_resets_a_file_without_a_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "Enable Auto Locking On Placement": true,
                "Auto Authorize Team": false
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.version, CURRENT_VERSION);
        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["Version"], CURRENT_VERSION);
        assert_eq!(saved["Enable Auto Locking On Placement"], false);
    }

    #[test]
    fn load_migrates_file_written_by_2_0_0() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "Version": "2.0.0",
                "Enable Auto Locking On Placement": true,
                "Auto Authorize Team": false,
                "Auto Authorize Clan": true
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.auto_lock_on_placement);
        assert!(!config.auto_authorize_team);
        assert!(config.auto_authorize_clan);
        assert!(config.allow_static_gating);

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["Version"], CURRENT_VERSION);
        assert_eq!(saved["Allow Locking Static Extractors"], true);
    }
}

//! Operator settings loading.
//!
//! Settings are loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.modsieve/config.toml` (user)
//! 3. `/etc/modsieve/config.toml` (system)
//!
//! ```toml
//! [cache]
//! prefix = "modsieve:"
//! max_entries = 10000
//!
//! [cache.ttl]
//! submission = 60
//! content = 300
//! item_criteria = false
//!
//! [communities.rust]
//! footer = "I am a bot."
//!
//! [communities.rust.cache.ttl]
//! author_activities = 0
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache::{CacheOverrides, CacheSettings, Ttl, TtlOverrides, TtlSettings};
use crate::{ModsieveError, Result};

/// Operator settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub communities: HashMap<String, CommunitySection>,
}

/// Shared cache defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Prefix of every key this process writes (default: "modsieve:").
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    #[serde(default)]
    pub ttl: TtlSection,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            max_entries: default_max_entries(),
            ttl: TtlSection::default(),
        }
    }
}

fn default_prefix() -> String {
    "modsieve:".to_string()
}

fn default_max_entries() -> u64 {
    crate::cache::DEFAULT_MAX_ENTRIES
}

/// TTL table in snake_case, as written in TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TtlSection {
    pub submission: Option<Ttl>,
    pub comment: Option<Ttl>,
    pub author_activities: Option<Ttl>,
    pub content: Option<Ttl>,
    pub author_criteria: Option<Ttl>,
    pub item_criteria: Option<Ttl>,
}

impl TtlSection {
    fn overrides(&self) -> TtlOverrides {
        TtlOverrides {
            submission: self.submission,
            comment: self.comment,
            author_activities: self.author_activities,
            content: self.content,
            author_criteria: self.author_criteria,
            item_criteria: self.item_criteria,
        }
    }
}

/// Per-community overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommunitySection {
    /// Text appended to bot replies; not part of the cache identity.
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default)]
    pub cache: CommunityCacheSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommunityCacheSection {
    #[serde(default)]
    pub max_entries: Option<u64>,
    #[serde(default)]
    pub ttl: TtlSection,
}

impl Settings {
    /// Load settings from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.modsieve/config.toml`
    /// 3. `/etc/modsieve/config.toml`
    ///
    /// Returns defaults when no file exists and no explicit path was given.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ModsieveError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            ModsieveError::Configuration(msg) => {
                ModsieveError::Configuration(format!("{msg} (in {path:?})"))
            }
            other => other,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ModsieveError::Configuration(format!("Failed to parse settings: {e}")))
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(ModsieveError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".modsieve").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/modsieve/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Shared cache defaults every community starts from.
    pub fn cache_defaults(&self) -> CacheSettings {
        CacheOverrides {
            max_entries: Some(self.cache.max_entries),
            ttl: self.cache.ttl.overrides(),
        }
        .apply(&CacheSettings {
            max_entries: self.cache.max_entries,
            ttl: TtlSettings::default(),
        })
    }

    /// The partial cache settings configured for `community`.
    pub fn community_overrides(&self, community: &str) -> CacheOverrides {
        self.communities
            .get(community)
            .map(|c| CacheOverrides {
                max_entries: c.cache.max_entries,
                ttl: c.cache.ttl.overrides(),
            })
            .unwrap_or_default()
    }

    pub fn footer(&self, community: &str) -> Option<String> {
        self.communities.get(community).and_then(|c| c.footer.clone())
    }
}

//! Configuration provider – persisted thresholds and atomic snapshot reloads.
//!
//! ## Persisted layout (JSON)
//!
//! ```text
//! {
//!   "main": {
//!     "debug": false,
//!     "interval": 30,
//!     "worlds": ["world"],
//!     "settings": {
//!       "maxEntityWarning": 50,
//!       "maxBlockUpdateWarning": 100,
//!       "maxRedstoneUpdateWarning": 20
//!     }
//!   }
//! }
//! ```
//!
//! A missing file or missing `main` section is filled with the defaults above
//! and written back. Missing keys inside `main` take their default.
//!
//! Readers always get a whole `Arc<ThresholdConfig>`; `reload` swaps the
//! pointer, it never edits a published snapshot.

use crate::error::ConfigError;
use crate::types::{Settings, ThresholdConfig};
use log::{info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Persisted document
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct PersistedConfig {
    #[serde(default)]
    main: Option<MainSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct MainSection {
    debug: bool,
    interval: u64,
    worlds: Vec<String>,
    settings: PersistedSettings,
}

impl Default for MainSection {
    fn default() -> Self {
        let defaults = ThresholdConfig::default();
        Self {
            debug: defaults.debug,
            interval: defaults.sample_interval_secs,
            worlds: defaults.watched_worlds.into_iter().collect(),
            settings: PersistedSettings::default(),
        }
    }
}

// The `config` crate may fold key case, so accept the lowercased spelling too.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct PersistedSettings {
    #[serde(rename = "maxEntityWarning", alias = "maxentitywarning")]
    max_entity_warning: u64,
    #[serde(rename = "maxBlockUpdateWarning", alias = "maxblockupdatewarning")]
    max_block_update_warning: u64,
    #[serde(rename = "maxRedstoneUpdateWarning", alias = "maxredstoneupdatewarning")]
    max_redstone_update_warning: u64,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        let s = Settings::default();
        Self {
            max_entity_warning: s.max_entity_warning,
            max_block_update_warning: s.max_block_update_warning,
            max_redstone_update_warning: s.max_redstone_update_warning,
        }
    }
}

impl TryFrom<MainSection> for ThresholdConfig {
    type Error = ConfigError;

    fn try_from(main: MainSection) -> Result<Self, Self::Error> {
        if main.interval == 0 {
            return Err(ConfigError::Invalid("interval must be at least 1 second".into()));
        }
        let mut worlds: std::collections::BTreeSet<String> = main
            .worlds
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if worlds.is_empty() {
            worlds = ThresholdConfig::default().watched_worlds;
        }
        Ok(ThresholdConfig {
            debug: main.debug,
            sample_interval_secs: main.interval,
            watched_worlds: worlds,
            settings: Settings {
                max_entity_warning: main.settings.max_entity_warning,
                max_block_update_warning: main.settings.max_block_update_warning,
                max_redstone_update_warning: main.settings.max_redstone_update_warning,
            },
        })
    }
}

/// Read `path`, writing the default `main` section first if it is absent.
fn read_document(path: &Path) -> Result<ThresholdConfig, ConfigError> {
    if !path.exists() {
        write_default_section(path, serde_json::Value::Object(Default::default()))?;
    }

    let raw = config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Json))
        .build()?;
    let persisted: PersistedConfig = raw.try_deserialize()?;

    let main = match persisted.main {
        Some(main) => main,
        None => {
            let existing: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            write_default_section(path, existing)?
        }
    };
    ThresholdConfig::try_from(main)
}

fn write_default_section(
    path: &Path,
    mut document: serde_json::Value,
) -> Result<MainSection, ConfigError> {
    let main = MainSection::default();
    let Some(object) = document.as_object_mut() else {
        return Err(ConfigError::Corrupted("top level is not an object".into()));
    };
    object.insert("main".into(), serde_json::to_value(&main)?);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&document)?)?;
    info!("Wrote default configuration to {}", path.display());
    Ok(main)
}

// ---------------------------------------------------------------------------
// ConfigProvider
// ---------------------------------------------------------------------------

pub struct ConfigProvider {
    source: Option<PathBuf>,
    current: RwLock<Arc<ThresholdConfig>>,
}

impl ConfigProvider {
    /// Load the startup snapshot from `path`.
    ///
    /// A corrupted or invalid document falls back to the compiled-in defaults
    /// with a warning. Only I/O failure (defaults cannot be read or written)
    /// is returned as an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = match read_document(&path) {
            Ok(config) => config,
            Err(ConfigError::Io(e)) => return Err(ConfigError::Io(e)),
            Err(e) => {
                warn!(
                    "{} in {}; continuing with defaults",
                    e,
                    path.display()
                );
                ThresholdConfig::default()
            }
        };
        announce(&config);
        Ok(Self {
            source: Some(path),
            current: RwLock::new(Arc::new(config)),
        })
    }

    /// A provider with no backing file; `reload` keeps the snapshot as is.
    pub fn in_memory(config: ThresholdConfig) -> Self {
        Self {
            source: None,
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// The latest successfully loaded snapshot.
    pub fn current(&self) -> Arc<ThresholdConfig> {
        self.current.read().clone()
    }

    pub fn path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Re-read the persisted document and swap in the new snapshot.
    ///
    /// On failure the previous snapshot stays current and the error is
    /// returned.
    pub fn reload(&self) -> Result<Arc<ThresholdConfig>, ConfigError> {
        let Some(path) = &self.source else {
            return Ok(self.current());
        };
        match read_document(path) {
            Ok(config) => {
                announce(&config);
                Ok(self.swap(config))
            }
            Err(e) => {
                warn!("Reload of {} rejected, keeping previous configuration: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Publish an explicit snapshot, e.g. from a host that owns persistence.
    pub fn replace(&self, config: ThresholdConfig) -> Result<Arc<ThresholdConfig>, ConfigError> {
        if config.sample_interval_secs == 0 {
            return Err(ConfigError::Invalid("interval must be at least 1 second".into()));
        }
        Ok(self.swap(config))
    }

    fn swap(&self, config: ThresholdConfig) -> Arc<ThresholdConfig> {
        let next = Arc::new(config);
        *self.current.write() = next.clone();
        next
    }
}

impl std::fmt::Debug for ConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigProvider")
            .field("source", &self.source)
            .field("current", &*self.current.read())
            .finish()
    }
}

fn announce(config: &ThresholdConfig) {
    info!(
        "Configuration loaded (interval={}s, worlds={:?})",
        config.sample_interval_secs, config.watched_worlds
    );
    if config.debug {
        info!("Debug sampling output enabled");
    }
}

/// Key/value settings storage.
///
/// Every view toggle, color and the column/sort layout is read from and
/// written to a [`SettingsStore`]. The engine only reads settings through
/// [`TreeConfig::load`], which turns them into an immutable snapshot.
pub mod config;

pub use config::{Color, ColorScheme, ToggleEffect, TreeConfig, ViewToggle};

use crate::error::{DevSleuthError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ── Setting keys ───────────────────────────────────────────────────

pub const AUTO_REFRESH: &str = "DeviceTreeAutoRefresh";
pub const SHOW_DISCONNECTED: &str = "DeviceTreeShowDisconnected";
pub const SHOW_SOFTWARE_COMPONENTS: &str = "DeviceShowSoftwareComponents";
pub const SHOW_DEVICE_INTERFACES: &str = "DeviceShowDeviceInterfaces";
pub const SHOW_DISABLED_DEVICE_INTERFACES: &str = "DeviceShowDisabledDeviceInterfaces";
pub const HIGHLIGHT_UPPER_FILTERED: &str = "DeviceTreeHighlightUpperFiltered";
pub const HIGHLIGHT_LOWER_FILTERED: &str = "DeviceTreeHighlightLowerFiltered";
pub const SHOW_ROOT: &str = "DeviceShowRoot";
pub const SORT_CHILDREN_BY_NAME: &str = "DeviceSortChildrenByName";
pub const HIGHLIGHTING_DURATION: &str = "DeviceHighlightingDuration";

pub const PROBLEM_COLOR: &str = "DeviceProblemColor";
pub const DISABLED_COLOR: &str = "DeviceDisabledColor";
pub const DISCONNECTED_COLOR: &str = "DeviceDisconnectedColor";
pub const HIGHLIGHT_COLOR: &str = "DeviceHighlightColor";
pub const INTERFACE_COLOR: &str = "DeviceInterfaceColor";
pub const DISABLED_INTERFACE_COLOR: &str = "DeviceDisabledInterfaceColor";
pub const ARRIVED_COLOR: &str = "DeviceArrivedColor";

pub const TREE_COLUMNS: &str = "DeviceTreeColumns";
pub const TREE_SORT: &str = "DeviceTreeSort";

/// Read/write access to persisted settings.
///
/// Values are either integers (toggles, durations, `0xRRGGBB` colors) or
/// strings (column layout, sort state). Missing keys read as `None` and
/// callers fall back to their defaults.
pub trait SettingsStore: Send {
    fn get_integer(&self, key: &str) -> Option<i64>;
    fn set_integer(&mut self, key: &str, value: i64);
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&mut self, key: &str, value: &str);

    /// Persist pending changes. A no-op for in-memory stores.
    fn flush(&mut self) -> Result<()>;

    /// Boolean view of an integer setting (non-zero is `true`).
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_integer(key).map(|v| v != 0)
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.set_integer(key, i64::from(value));
    }
}

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Integer(i64),
    String(String),
}

// ── In-memory store ────────────────────────────────────────────────

/// Settings held only in memory. Used by tests and embedders that manage
/// persistence themselves.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    values: BTreeMap<String, SettingValue>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_integer(&self, key: &str) -> Option<i64> {
        read_integer(&self.values, key)
    }

    fn set_integer(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_owned(), SettingValue::Integer(value));
    }

    fn get_string(&self, key: &str) -> Option<String> {
        read_string(&self.values, key)
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_owned(), SettingValue::String(value.to_owned()));
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

// ── JSON file store ────────────────────────────────────────────────

/// Settings persisted as a flat JSON object.
///
/// Writes are buffered in memory and written on [`flush`](SettingsStore::flush)
/// (and on drop, best effort).
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    values: BTreeMap<String, SettingValue>,
    dirty: bool,
}

impl JsonSettingsStore {
    /// Open the settings file at `path`. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| {
                DevSleuthError::SettingsFormat {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file yet; using defaults");
                BTreeMap::new()
            }
            Err(source) => return Err(DevSleuthError::SettingsIo { path, source }),
        };

        info!(path = %path.display(), keys = values.len(), "Settings loaded");
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get_integer(&self, key: &str) -> Option<i64> {
        read_integer(&self.values, key)
    }

    fn set_integer(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_owned(), SettingValue::Integer(value));
        self.dirty = true;
    }

    fn get_string(&self, key: &str) -> Option<String> {
        read_string(&self.values, key)
    }

    fn set_string(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_owned(), SettingValue::String(value.to_owned()));
        self.dirty = true;
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let io_err = |source| DevSleuthError::SettingsIo {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(&self.values).map_err(|source| {
            DevSleuthError::SettingsFormat {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, text).map_err(io_err)?;

        self.dirty = false;
        debug!(path = %self.path.display(), "Settings flushed");
        Ok(())
    }
}

impl Drop for JsonSettingsStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to save settings: {e}");
        }
    }
}

fn read_integer(values: &BTreeMap<String, SettingValue>, key: &str) -> Option<i64> {
    match values.get(key)? {
        SettingValue::Integer(v) => Some(*v),
        SettingValue::String(s) => s.trim().parse().ok(),
    }
}

fn read_string(values: &BTreeMap<String, SettingValue>, key: &str) -> Option<String> {
    match values.get(key)? {
        SettingValue::String(s) => Some(s.clone()),
        SettingValue::Integer(v) => Some(v.to_string()),
    }
}

//! Configuration: TOML file + smart defaults, immutable after vault creation.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, VaultError};

/// Size/count budgets for one log directory.
///
/// Supplied once to [`LogVault::new`](crate::vault::manager::LogVault::new)
/// and immutable afterward. Out-of-range values are clamped by
/// [`sanitized`](Self::sanitized), never rejected: a crash reporter must not
/// refuse to start over a bad knob.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VaultConfig {
    /// Flat directory holding crash logs and placeholder files.
    pub log_dir: PathBuf,
    /// Maximum retained panic-kind logs (clamped to >= 1).
    pub max_panic_logs: usize,
    /// Maximum retained native-kind logs (clamped to >= 1).
    pub max_native_logs: usize,
    /// Target number of clean placeholder files. 0 disables the
    /// reservation pool entirely.
    pub placeholder_count: usize,
    /// Target size of each placeholder in KiB. 0 yields near-empty
    /// reservations.
    pub placeholder_size_kb: u64,
    /// Delay before a deferred maintenance pass starts. Negative values
    /// clamp to 0.
    pub maintenance_delay_ms: i64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::new(),
            max_panic_logs: 10,
            max_native_logs: 10,
            placeholder_count: 0,
            placeholder_size_kb: 128,
            maintenance_delay_ms: 5_000,
        }
    }
}

impl VaultConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| VaultError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Return a copy with out-of-range values clamped into their valid
    /// domains.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            log_dir: self.log_dir.clone(),
            max_panic_logs: self.max_panic_logs.max(1),
            max_native_logs: self.max_native_logs.max(1),
            placeholder_count: self.placeholder_count,
            placeholder_size_kb: self.placeholder_size_kb,
            maintenance_delay_ms: self.maintenance_delay_ms.max(0),
        }
    }

    /// Whether the placeholder reservation pool is enabled at all.
    #[must_use]
    pub fn pool_enabled(&self) -> bool {
        self.placeholder_count > 0
    }

    /// Target placeholder size in bytes.
    #[must_use]
    pub fn placeholder_size_bytes(&self) -> u64 {
        self.placeholder_size_kb * 1024
    }

    /// Deferred-maintenance delay as a `Duration` (negative clamps to 0).
    #[must_use]
    pub fn maintenance_delay(&self) -> Duration {
        Duration::from_millis(u64::try_from(self.maintenance_delay_ms).unwrap_or(0))
    }
}

//! CLV-prefixed error types with structured error codes.
//!
//! Nothing in this taxonomy is fatal: every error is caught at the
//! [`LogVault`](crate::vault::manager::LogVault) boundary, reported through
//! the diagnostic sink, and degraded to a `bool`/`Option` return.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the crate.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Top-level error type for crashlog_vault.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("[CLV-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CLV-1002] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CLV-2001] log directory unavailable: {path}")]
    DirUnavailable { path: PathBuf },

    #[error("[CLV-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CLV-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[CLV-3002] lost rename race for {path}")]
    RaceLost { path: PathBuf },

    #[error("[CLV-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl VaultError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CLV-1001",
            Self::ConfigParse { .. } => "CLV-1002",
            Self::DirUnavailable { .. } => "CLV-2001",
            Self::Serialization { .. } => "CLV-2101",
            Self::Io { .. } => "CLV-3001",
            Self::RaceLost { .. } => "CLV-3002",
            Self::Runtime { .. } => "CLV-3900",
        }
    }

    /// Whether retrying against another candidate file might resolve the
    /// failure. Race losses always are; config problems never are.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::RaceLost { .. } | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for VaultError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

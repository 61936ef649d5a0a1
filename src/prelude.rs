//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use crashlog_vault::prelude::*;
//! ```

// Core
pub use crate::core::config::VaultConfig;
pub use crate::core::errors::{Result, VaultError};

// Diagnostics
pub use crate::diag::{DiagRecord, DiagSink, MemorySink, NullSink, Severity, StderrSink, VaultOp};

// Vault
pub use crate::vault::maintenance::{InitialCounts, MaintenancePlan};
pub use crate::vault::manager::{LogVault, MaintenanceStatus};
pub use crate::vault::naming::{FileCategory, IdGenerator, LogKind, PlaceholderState, classify};
pub use crate::vault::placeholder::{PlaceholderPool, RefillReport};
pub use crate::vault::recycle::LogRecycler;
pub use crate::vault::retention::Maintainer;

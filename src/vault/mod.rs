//! Vault internals: naming, scanning, placeholder pool, recycling,
//! retention, append writer, maintenance scheduling, and the public
//! [`LogVault`](manager::LogVault) surface.

pub mod append;
pub mod maintenance;
pub mod manager;
pub mod naming;
pub mod placeholder;
pub mod recycle;
pub mod retention;
pub mod scan;

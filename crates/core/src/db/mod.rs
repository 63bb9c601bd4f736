//! Workspace configuration, layout, and the SQLite image cache.
//!
//! - `PatcherConfig`: serializable workspace settings (patch store, cache
//!   path, catalog path, baseline overrides).
//! - `WorkspaceLayout`: computed paths for workspace files.
//! - `CacheDb`: SQLite-backed [`ImageCache`] plus per-target save records.
//! - `PatcherContext`: layout + config + open cache bundled together.

pub mod cache_db;
pub mod config;
pub mod context;
pub mod layout;
pub mod models;
pub mod util;

pub use cache_db::*;
pub use config::*;
pub use context::*;
pub use layout::*;
pub use models::*;
pub use util::*;

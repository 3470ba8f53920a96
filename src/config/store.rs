//! `[store]` section configuration.
//!
//! Selects the content store backend the sitemaps are generated from.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Content store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite database with the seomap schema.
    #[default]
    Sqlite,
    /// JSON fixture loaded into memory at startup.
    Json,
}

/// `[store]` section in seomap.toml.
///
/// # Example
/// ```toml
/// [store]
/// backend = "sqlite"
/// path = "content.db"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default = "defaults::store::backend")]
    #[educe(Default = defaults::store::backend())]
    pub backend: StoreBackend,

    /// Database or fixture path, relative to the project root.
    #[serde(default = "defaults::store::path")]
    #[educe(Default = defaults::store::path())]
    pub path: PathBuf,
}

//! Content store access.
//!
//! The sitemap subsystem only reads from the store: counts, ordered and
//! filtered listings, permalinks, and a few flags. [`ContentStore`] is the
//! seam; two backends implement it.
//!
//! | Backend       | Source                                    |
//! |---------------|-------------------------------------------|
//! | [`SqliteStore`] | SQLite database with the seomap schema  |
//! | [`MemoryStore`] | JSON fixture loaded at startup          |

mod error;
mod memory;
mod schema;
mod sqlite;
mod types;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{
    ContentItem, ContentType, ItemQuery, ItemStatus, Taxonomy, Term, TermQuery, item_order,
    term_order,
};

use crate::config::{SiteConfig, StoreBackend};
use crate::log;
use chrono::{DateTime, Utc};

/// Read access to the surrounding content store.
pub trait ContentStore: Send + Sync {
    /// Every registered content type, public or not.
    fn content_types(&self) -> StoreResult<Vec<ContentType>>;

    /// Every registered taxonomy, public or not.
    fn taxonomies(&self) -> StoreResult<Vec<Taxonomy>>;

    fn content_type_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.content_types()?.iter().any(|t| t.name == name))
    }

    fn taxonomy_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.taxonomies()?.iter().any(|t| t.name == name))
    }

    /// Number of published items of a type. Unknown types count 0.
    fn count_published(&self, content_type: &str) -> StoreResult<u64>;

    /// Number of terms with at least one item. Unknown taxonomies count 0.
    fn count_terms(&self, taxonomy: &str) -> StoreResult<u64>;

    /// Items matching `query`, newest modification first.
    fn list_items(&self, query: &ItemQuery) -> StoreResult<Vec<ContentItem>>;

    /// Non-empty terms, largest count first.
    fn list_terms(&self, query: &TermQuery) -> StoreResult<Vec<Term>>;

    /// Newest modification time among published items of a type.
    fn last_modified(&self, content_type: &str) -> StoreResult<Option<DateTime<Utc>>>;

    /// Newest modification time among published items filed under a term.
    fn term_last_modified(&self, term: &Term) -> StoreResult<Option<DateTime<Utc>>>;

    /// Id of the page designated as the site's front page.
    fn front_page(&self) -> StoreResult<Option<u64>>;

    fn item_permalink(&self, item: &ContentItem) -> Option<String> {
        item.permalink.clone()
    }

    fn term_permalink(&self, term: &Term) -> Option<String> {
        term.permalink.clone()
    }
}

/// Open the backend selected in `[store]`.
pub fn open(config: &SiteConfig) -> StoreResult<Box<dyn ContentStore>> {
    let path = &config.store.path;
    let store: Box<dyn ContentStore> = match config.store.backend {
        StoreBackend::Sqlite => Box::new(SqliteStore::open(path)?),
        StoreBackend::Json => Box::new(MemoryStore::from_path(path)?),
    };
    log!("store"; "opened {}", path.display());
    Ok(store)
}

/// Store whose every read fails, for exercising error paths.
#[cfg(test)]
pub struct FailingStore;

#[cfg(test)]
impl FailingStore {
    fn fail<T>() -> StoreResult<T> {
        Err(StoreError::InvalidData("store unavailable".into()))
    }
}

#[cfg(test)]
impl ContentStore for FailingStore {
    fn content_types(&self) -> StoreResult<Vec<ContentType>> {
        Self::fail()
    }

    fn taxonomies(&self) -> StoreResult<Vec<Taxonomy>> {
        Self::fail()
    }

    fn count_published(&self, _: &str) -> StoreResult<u64> {
        Self::fail()
    }

    fn count_terms(&self, _: &str) -> StoreResult<u64> {
        Self::fail()
    }

    fn list_items(&self, _: &ItemQuery) -> StoreResult<Vec<ContentItem>> {
        Self::fail()
    }

    fn list_terms(&self, _: &TermQuery) -> StoreResult<Vec<Term>> {
        Self::fail()
    }

    fn last_modified(&self, _: &str) -> StoreResult<Option<DateTime<Utc>>> {
        Self::fail()
    }

    fn term_last_modified(&self, _: &Term) -> StoreResult<Option<DateTime<Utc>>> {
        Self::fail()
    }

    fn front_page(&self) -> StoreResult<Option<u64>> {
        Self::fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_open_json_backend() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("site.json");
        fs::write(
            &path,
            r#"{ "content_types": [{ "name": "post" }], "items": [{ "id": 1, "content_type": "post" }] }"#,
        )
        .unwrap();

        let mut config = SiteConfig::default();
        config.store.backend = StoreBackend::Json;
        config.store.path = path;

        let store = open(&config).unwrap();
        assert!(store.content_type_exists("post").unwrap());
        assert_eq!(store.count_published("post").unwrap(), 1);
    }

    #[test]
    fn test_open_sqlite_backend() {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.store.path = dir.path().join("content.db");

        let store = open(&config).unwrap();
        assert!(store.content_types().unwrap().is_empty());
        assert_eq!(store.front_page().unwrap(), None);
    }
}

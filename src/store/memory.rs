//! In-memory content store.
//!
//! Holds a snapshot of content types, taxonomies, items, and terms loaded
//! from a JSON fixture. Listings apply the same ordering and predicates as
//! the SQLite backend so the two are interchangeable.
//!
//! # Fixture format
//!
//! ```json
//! {
//!   "content_types": [{ "name": "post" }, { "name": "attachment", "public": false }],
//!   "taxonomies": [{ "name": "category" }],
//!   "items": [
//!     { "id": 1, "content_type": "post", "modified": "2025-01-01T00:00:00Z",
//!       "permalink": "/hello/", "terms": [10] }
//!   ],
//!   "terms": [{ "id": 10, "taxonomy": "category", "name": "News", "count": 1,
//!               "permalink": "/category/news/" }],
//!   "front_page": 2
//! }
//! ```

use super::{
    ContentItem, ContentStore, ContentType, ItemQuery, ItemStatus, StoreError, StoreResult,
    Taxonomy, Term, TermQuery, item_order, term_order,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Content store backed by plain vectors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryStore {
    #[serde(default)]
    pub content_types: Vec<ContentType>,
    #[serde(default)]
    pub taxonomies: Vec<Taxonomy>,
    #[serde(default)]
    pub items: Vec<ContentItem>,
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub front_page: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON fixture.
    pub fn from_json(path: &Path, content: &str) -> StoreResult<Self> {
        serde_json::from_str(content).map_err(|err| StoreError::Json(path.to_path_buf(), err))
    }

    /// Load a JSON fixture from disk.
    pub fn from_path(path: &Path) -> StoreResult<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| StoreError::Io(path.to_path_buf(), err))?;
        Self::from_json(path, &content)
    }

    pub fn with_content_type(mut self, name: &str, public: bool) -> Self {
        self.content_types.push(ContentType {
            name: name.into(),
            public,
        });
        self
    }

    pub fn with_taxonomy(mut self, name: &str, public: bool) -> Self {
        self.taxonomies.push(Taxonomy {
            name: name.into(),
            public,
        });
        self
    }

    #[cfg(test)]
    pub fn push_item(&mut self, item: ContentItem) {
        self.items.push(item);
    }

    #[cfg(test)]
    pub fn push_term(&mut self, term: Term) {
        self.terms.push(term);
    }

    fn published<'a>(&'a self, content_type: &'a str) -> impl Iterator<Item = &'a ContentItem> {
        self.items
            .iter()
            .filter(move |i| i.content_type == content_type && i.status == ItemStatus::Publish)
    }

    fn non_empty_terms<'a>(&'a self, taxonomy: &'a str) -> impl Iterator<Item = &'a Term> {
        self.terms
            .iter()
            .filter(move |t| t.taxonomy == taxonomy && t.count > 0)
    }
}

/// Clamp a `u64` offset or limit to `usize` for iterator adapters.
fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

impl ContentStore for MemoryStore {
    fn content_types(&self) -> StoreResult<Vec<ContentType>> {
        Ok(self.content_types.clone())
    }

    fn taxonomies(&self) -> StoreResult<Vec<Taxonomy>> {
        Ok(self.taxonomies.clone())
    }

    fn count_published(&self, content_type: &str) -> StoreResult<u64> {
        Ok(self.published(content_type).count() as u64)
    }

    fn count_terms(&self, taxonomy: &str) -> StoreResult<u64> {
        Ok(self.non_empty_terms(taxonomy).count() as u64)
    }

    fn list_items(&self, query: &ItemQuery) -> StoreResult<Vec<ContentItem>> {
        let mut items: Vec<_> = self.items.iter().filter(|i| query.matches(i)).collect();
        items.sort_by(|a, b| item_order(a, b));
        Ok(items
            .into_iter()
            .skip(to_usize(query.offset))
            .take(to_usize(query.limit))
            .cloned()
            .collect())
    }

    fn list_terms(&self, query: &TermQuery) -> StoreResult<Vec<Term>> {
        let mut terms: Vec<_> = self.non_empty_terms(&query.taxonomy).collect();
        terms.sort_by(|a, b| term_order(a, b));
        Ok(terms
            .into_iter()
            .skip(to_usize(query.offset))
            .take(to_usize(query.limit))
            .cloned()
            .collect())
    }

    fn last_modified(&self, content_type: &str) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self.published(content_type).filter_map(|i| i.modified).max())
    }

    fn term_last_modified(&self, term: &Term) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self
            .items
            .iter()
            .filter(|i| i.status == ItemStatus::Publish && i.terms.contains(&term.id))
            .filter_map(|i| i.modified)
            .max())
    }

    fn front_page(&self) -> StoreResult<Option<u64>> {
        Ok(self.front_page)
    }
}

//! Read models handed out by a [`ContentStore`](super::ContentStore).

use crate::config::defaults;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeSet};

/// A registered content type (`post`, `page`, `product`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentType {
    pub name: String,
    #[serde(default = "defaults::r#true")]
    pub public: bool,
}

/// A registered taxonomy (`category`, `post_tag`, `product_cat`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Taxonomy {
    pub name: String,
    #[serde(default = "defaults::r#true")]
    pub public: bool,
}

/// Publication status of a content item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Publish,
    Draft,
    Pending,
    Private,
    Future,
    #[serde(other)]
    Other,
}

impl ItemStatus {
    /// Value stored in the `items.status` column.
    #[cfg(test)]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Private => "private",
            Self::Future => "future",
            Self::Other => "trash",
        }
    }
}

/// A publishable unit owned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentItem {
    pub id: u64,
    pub content_type: String,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub noindex: bool,
    #[serde(default)]
    pub password_protected: bool,
    /// Term ids the item is filed under.
    #[serde(default)]
    pub terms: Vec<u64>,
}

/// A taxonomy term with its denormalized item count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Term {
    pub id: u64,
    pub taxonomy: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub permalink: Option<String>,
}

/// Newest modification first, then highest id.
pub fn item_order(a: &ContentItem, b: &ContentItem) -> Ordering {
    b.modified.cmp(&a.modified).then_with(|| b.id.cmp(&a.id))
}

/// Largest count first, then lowest id.
pub fn term_order(a: &Term, b: &Term) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id))
}

// ============================================================================
// Queries
// ============================================================================

/// Listing of published items of one type, filtered before slicing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemQuery {
    pub content_type: String,
    pub offset: u64,
    pub limit: u64,
    pub exclude_ids: BTreeSet<u64>,
    pub skip_password_protected: bool,
    pub skip_noindex: bool,
}

impl ItemQuery {
    /// All published items of `content_type`, unfiltered and unbounded.
    pub fn published(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            offset: 0,
            limit: u64::MAX,
            exclude_ids: BTreeSet::new(),
            skip_password_protected: false,
            skip_noindex: false,
        }
    }

    pub fn page(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn excluding(mut self, ids: &BTreeSet<u64>) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    /// Drop password-protected and noindex items.
    pub fn indexable(mut self) -> Self {
        self.skip_password_protected = true;
        self.skip_noindex = true;
        self
    }

    /// Whether `item` passes every predicate of this query.
    pub fn matches(&self, item: &ContentItem) -> bool {
        item.content_type == self.content_type
            && item.status == ItemStatus::Publish
            && !(self.skip_password_protected && item.password_protected)
            && !(self.skip_noindex && item.noindex)
            && !self.exclude_ids.contains(&item.id)
    }
}

/// Listing of non-empty terms of one taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermQuery {
    pub taxonomy: String,
    pub offset: u64,
    pub limit: u64,
}

impl TermQuery {
    pub fn new(taxonomy: impl Into<String>, offset: u64, limit: u64) -> Self {
        Self {
            taxonomy: taxonomy.into(),
            offset,
            limit,
        }
    }
}

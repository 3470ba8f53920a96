//! Change-frequency and priority lookup.
//!
//! Built-in tables keyed by content type or taxonomy name, overridden per
//! name by the `[sitemap.*changefreq]` / `[sitemap.*priority]` tables.

use crate::config::{ChangeFreq, SitemapConfig};
use std::fmt;

const DEFAULT_CHANGEFREQ: ChangeFreq = ChangeFreq::Monthly;
const DEFAULT_PRIORITY: Priority = Priority(5);

/// Terms with more items than this get a priority boost.
pub const TERM_BOOST_THRESHOLD: u64 = 10;

const CHANGEFREQ: &[(&str, ChangeFreq)] = &[
    ("post", ChangeFreq::Weekly),
    ("page", ChangeFreq::Monthly),
    ("product", ChangeFreq::Weekly),
];

const TAXONOMY_CHANGEFREQ: &[(&str, ChangeFreq)] = &[
    ("category", ChangeFreq::Weekly),
    ("post_tag", ChangeFreq::Weekly),
    ("product_cat", ChangeFreq::Weekly),
    ("product_tag", ChangeFreq::Monthly),
];

const PRIORITY: &[(&str, Priority)] = &[
    ("page", Priority(8)),
    ("post", Priority(6)),
    ("product", Priority(7)),
];

const TAXONOMY_PRIORITY: &[(&str, Priority)] = &[
    ("category", Priority(6)),
    ("post_tag", Priority(4)),
    ("product_cat", Priority(7)),
    ("product_tag", Priority(4)),
];

fn lookup<T: Copy>(table: &[(&str, T)], name: &str) -> Option<T> {
    table.iter().find(|(key, _)| *key == name).map(|(_, v)| *v)
}

// ============================================================================
// Priority
// ============================================================================

/// Sitemap `<priority>` in tenths, always within `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(10);

    /// Round to the nearest tenth and clamp into range. NaN maps to 0.0.
    pub fn from_f32(value: f32) -> Self {
        let tenths = (value * 10.0).round();
        if tenths.is_nan() || tenths <= 0.0 {
            Self::MIN
        } else if tenths >= 10.0 {
            Self::MAX
        } else {
            Self(tenths as u8)
        }
    }

    /// One tenth higher, capped at 1.0.
    pub fn boosted(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::MAX.0))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

// ============================================================================
// Entry Policy
// ============================================================================

/// Resolves `<changefreq>` and `<priority>` for sitemap entries.
#[derive(Debug, Clone, Copy)]
pub struct EntryPolicy<'a> {
    config: &'a SitemapConfig,
}

impl<'a> EntryPolicy<'a> {
    pub fn new(config: &'a SitemapConfig) -> Self {
        Self { config }
    }

    pub fn changefreq(&self, content_type: &str) -> ChangeFreq {
        self.config
            .changefreq
            .get(content_type)
            .copied()
            .or_else(|| lookup(CHANGEFREQ, content_type))
            .unwrap_or(DEFAULT_CHANGEFREQ)
    }

    pub fn taxonomy_changefreq(&self, taxonomy: &str) -> ChangeFreq {
        self.config
            .taxonomy_changefreq
            .get(taxonomy)
            .copied()
            .or_else(|| lookup(TAXONOMY_CHANGEFREQ, taxonomy))
            .unwrap_or(DEFAULT_CHANGEFREQ)
    }

    /// Priority of an item. The front page always gets 1.0.
    pub fn priority(&self, content_type: &str, item_id: u64, front_page: Option<u64>) -> Priority {
        if front_page == Some(item_id) {
            return Priority::MAX;
        }
        self.config
            .priority
            .get(content_type)
            .map(|p| Priority::from_f32(*p))
            .or_else(|| lookup(PRIORITY, content_type))
            .unwrap_or(DEFAULT_PRIORITY)
    }

    /// Priority of a term, boosted by 0.1 when it holds more than
    /// [`TERM_BOOST_THRESHOLD`] items.
    pub fn taxonomy_priority(&self, taxonomy: &str, count: u64) -> Priority {
        let base = self
            .config
            .taxonomy_priority
            .get(taxonomy)
            .map(|p| Priority::from_f32(*p))
            .or_else(|| lookup(TAXONOMY_PRIORITY, taxonomy))
            .unwrap_or(DEFAULT_PRIORITY);

        if count > TERM_BOOST_THRESHOLD {
            base.boosted()
        } else {
            base
        }
    }
}

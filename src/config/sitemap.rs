//! `[sitemap]` section configuration.
//!
//! Page size, exclusions, and the change-frequency / priority overrides
//! that extend the built-in lookup tables.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Smallest number of URLs written to one sitemap file.
pub const MIN_PAGE_SIZE: u64 = 100;

/// Sitemap protocol limit on URLs per file.
pub const MAX_PAGE_SIZE: u64 = 50_000;

/// Sitemap protocol `<changefreq>` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

/// Cap on the page size once the site grows past `above` published items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSizeTier {
    pub above: u64,
    pub max_per_page: u64,
}

/// `[sitemap.large_site]` - shrink sitemap files on very large stores.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct LargeSiteConfig {
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    #[serde(default = "defaults::sitemap::large_site::tiers")]
    #[educe(Default = defaults::sitemap::large_site::tiers())]
    pub tiers: Vec<PageSizeTier>,
}

impl LargeSiteConfig {
    /// Smallest `max_per_page` among the tiers the site has outgrown.
    pub fn cap_for(&self, total_published: u64) -> Option<u64> {
        if !self.enable {
            return None;
        }
        self.tiers
            .iter()
            .filter(|tier| total_published > tier.above)
            .map(|tier| tier.max_per_page)
            .min()
    }
}

/// `[sitemap]` section in seomap.toml.
///
/// # Example
/// ```toml
/// [sitemap]
/// posts_per_page = 2000
/// exclude_posts = [12, 48]
/// exclude_post_types = ["attachment", "landing"]
///
/// [sitemap.changefreq]
/// post = "daily"
///
/// [sitemap.priority]
/// product = 0.9
///
/// [sitemap.taxonomy_priority]
/// product_cat = 0.8
///
/// [sitemap.large_site]
/// enable = true
/// tiers = [{ above = 10000, max_per_page = 500 }]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapConfig {
    /// URLs per sitemap file. Out-of-range values are clamped at use.
    #[serde(default = "defaults::sitemap::posts_per_page")]
    #[educe(Default = defaults::sitemap::posts_per_page())]
    pub posts_per_page: i64,

    /// Item ids never listed.
    #[serde(default)]
    pub exclude_posts: BTreeSet<u64>,

    /// Content types left out of the index.
    #[serde(default = "defaults::sitemap::exclude_post_types")]
    #[educe(Default = defaults::sitemap::exclude_post_types())]
    pub exclude_post_types: Vec<String>,

    /// Taxonomies left out of the index.
    #[serde(default)]
    pub exclude_taxonomies: Vec<String>,

    /// Per content type `<changefreq>` overrides.
    #[serde(default)]
    pub changefreq: BTreeMap<String, ChangeFreq>,

    /// Per content type `<priority>` overrides.
    #[serde(default)]
    pub priority: BTreeMap<String, f32>,

    /// Per taxonomy `<changefreq>` overrides.
    #[serde(default)]
    pub taxonomy_changefreq: BTreeMap<String, ChangeFreq>,

    /// Per taxonomy `<priority>` overrides.
    #[serde(default)]
    pub taxonomy_priority: BTreeMap<String, f32>,

    #[serde(default)]
    pub large_site: LargeSiteConfig,
}

impl SitemapConfig {
    /// Configured page size clamped to `[MIN_PAGE_SIZE, MAX_PAGE_SIZE]`.
    pub fn page_size(&self) -> u64 {
        let size = u64::try_from(self.posts_per_page).unwrap_or(0);
        size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    pub fn is_excluded_post_type(&self, name: &str) -> bool {
        self.exclude_post_types.iter().any(|t| t == name)
    }

    pub fn is_excluded_taxonomy(&self, name: &str) -> bool {
        self.exclude_taxonomies.iter().any(|t| t == name)
    }
}

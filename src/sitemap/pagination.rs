//! Pagination arithmetic over live store counts.
//!
//! A [`Paginator`] fixes the effective page size once, so every page count,
//! slice and URL it hands out agrees with the others for the lifetime of a
//! request.

use super::{SitemapKind, sitemap_path};
use crate::config::{MAX_PAGE_SIZE, MIN_PAGE_SIZE, SiteConfig, SitemapConfig};
use crate::store::{ContentStore, StoreResult};

/// `ceil(total_items / page_size)`, zero when there is nothing to list.
pub const fn total_pages(total_items: u64, page_size: u64) -> u64 {
    if total_items == 0 || page_size == 0 {
        0
    } else {
        total_items.div_ceil(page_size)
    }
}

/// Page size suggested for a site with `total_published` items.
pub const fn recommended_page_size(total_published: u64) -> u64 {
    match total_published {
        0..1_000 => 1_000,
        1_000..10_000 => 500,
        10_000..50_000 => 250,
        _ => 100,
    }
}

// ============================================================================
// Derived Values
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total_items: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub has_pagination: bool,
}

impl Pagination {
    pub const fn new(total_items: u64, page_size: u64) -> Self {
        Self {
            total_items,
            page_size,
            total_pages: total_pages(total_items, page_size),
            has_pagination: total_items > page_size,
        }
    }

    /// Offset window for a 1-based page. Page 0 is treated as page 1.
    pub const fn slice(&self, page: u64) -> PageSlice {
        PageSlice {
            offset: page.saturating_sub(1).saturating_mul(self.page_size),
            limit: self.page_size,
        }
    }

    /// Whether `page` may be requested. An empty listing still answers
    /// page 1 with an empty document.
    pub const fn contains(&self, page: u64) -> bool {
        let last = if self.total_pages > 1 { self.total_pages } else { 1 };
        page >= 1 && page <= last
    }
}

/// `OFFSET`/`LIMIT` window of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    pub url: String,
    pub page: u64,
    pub is_first: bool,
    pub is_last: bool,
}

/// Position of one page within its listing. Item numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub start_item: u64,
    pub end_item: u64,
    /// `page > 1`, even past the last page.
    pub has_previous: bool,
    pub has_next: bool,
    /// Only set when the previous page exists.
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

/// Pagination of every listing the index would publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapStats {
    pub page_size: u64,
    pub post_types: Vec<(String, Pagination)>,
    pub taxonomies: Vec<(String, Pagination)>,
}

impl SitemapStats {
    /// Number of listing files, excluding the index itself.
    pub fn total_sitemaps(&self) -> u64 {
        self.listings().map(|(_, p)| p.total_pages).sum()
    }

    pub fn total_urls(&self) -> u64 {
        self.listings().map(|(_, p)| p.total_items).sum()
    }

    /// Published items across all listed content types.
    pub fn total_published(&self) -> u64 {
        self.post_types.iter().map(|(_, p)| p.total_items).sum()
    }

    fn listings(&self) -> impl Iterator<Item = &(String, Pagination)> {
        self.post_types.iter().chain(&self.taxonomies)
    }
}

// ============================================================================
// Paginator
// ============================================================================

pub struct Paginator<'a> {
    store: &'a dyn ContentStore,
    config: &'a SiteConfig,
    page_size: u64,
}

impl<'a> Paginator<'a> {
    /// Resolve the effective page size against the store.
    pub fn new(store: &'a dyn ContentStore, config: &'a SiteConfig) -> StoreResult<Self> {
        let page_size = effective_page_size(store, &config.sitemap)?;
        Ok(Self {
            store,
            config,
            page_size,
        })
    }

    #[cfg(test)]
    pub const fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Content types published in the index: public and not excluded.
    pub fn indexed_post_types(&self) -> StoreResult<Vec<String>> {
        indexed_post_types(self.store, &self.config.sitemap)
    }

    /// Taxonomies published in the index: public and not excluded.
    pub fn indexed_taxonomies(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .store
            .taxonomies()?
            .into_iter()
            .filter(|t| t.public && !self.config.sitemap.is_excluded_taxonomy(&t.name))
            .map(|t| t.name)
            .collect())
    }

    /// One aggregate count; unknown names give a zero pagination.
    pub fn calculate(&self, name: &str, kind: SitemapKind) -> StoreResult<Pagination> {
        let total_items = match kind {
            SitemapKind::PostType => self.store.count_published(name)?,
            SitemapKind::Taxonomy => self.store.count_terms(name)?,
        };
        Ok(Pagination::new(total_items, self.page_size))
    }

    /// Absolute URL of one listing page.
    pub fn page_url(&self, name: &str, kind: SitemapKind, page: u64) -> String {
        self.config.base.absolute(&sitemap_path(kind, name, page))
    }

    pub fn page_urls(&self, name: &str, kind: SitemapKind) -> StoreResult<Vec<PageUrl>> {
        let pagination = self.calculate(name, kind)?;
        Ok((1..=pagination.total_pages)
            .map(|page| PageUrl {
                url: self.page_url(name, kind, page),
                page,
                is_first: page == 1,
                is_last: page == pagination.total_pages,
            })
            .collect())
    }

    pub fn is_valid_page(&self, name: &str, kind: SitemapKind, page: u64) -> StoreResult<bool> {
        let pagination = self.calculate(name, kind)?;
        Ok(page >= 1 && page <= pagination.total_pages)
    }

    pub fn page_info(&self, name: &str, kind: SitemapKind, page: u64) -> StoreResult<PageInfo> {
        let pagination = self.calculate(name, kind)?;
        let page = page.max(1);
        let slice = pagination.slice(page);

        let (start_item, end_item) = if slice.offset < pagination.total_items {
            let end = (slice.offset + slice.limit).min(pagination.total_items);
            (slice.offset + 1, end)
        } else {
            (0, 0)
        };

        let previous_url =
            (page > 1 && page - 1 <= pagination.total_pages).then(|| self.page_url(name, kind, page - 1));
        let next_url =
            (page < pagination.total_pages).then(|| self.page_url(name, kind, page + 1));

        Ok(PageInfo {
            page,
            total_pages: pagination.total_pages,
            total_items: pagination.total_items,
            start_item,
            end_item,
            has_previous: page > 1,
            has_next: page < pagination.total_pages,
            previous_url,
            next_url,
        })
    }

    /// Pagination of every indexed listing that has at least one page.
    pub fn stats(&self) -> StoreResult<SitemapStats> {
        let mut stats = SitemapStats {
            page_size: self.page_size,
            ..SitemapStats::default()
        };

        for name in self.indexed_post_types()? {
            let pagination = self.calculate(&name, SitemapKind::PostType)?;
            if pagination.total_pages > 0 {
                stats.post_types.push((name, pagination));
            }
        }
        for name in self.indexed_taxonomies()? {
            let pagination = self.calculate(&name, SitemapKind::Taxonomy)?;
            if pagination.total_pages > 0 {
                stats.taxonomies.push((name, pagination));
            }
        }

        Ok(stats)
    }
}

fn indexed_post_types(store: &dyn ContentStore, config: &SitemapConfig) -> StoreResult<Vec<String>> {
    Ok(store
        .content_types()?
        .into_iter()
        .filter(|t| t.public && !config.is_excluded_post_type(&t.name))
        .map(|t| t.name)
        .collect())
}

/// Configured size, capped by the large-site tiers when enabled.
fn effective_page_size(store: &dyn ContentStore, config: &SitemapConfig) -> StoreResult<u64> {
    let size = config.page_size();
    if !config.large_site.enable {
        return Ok(size);
    }

    let mut total = 0u64;
    for name in indexed_post_types(store, config)? {
        total = total.saturating_add(store.count_published(&name)?);
    }

    Ok(match config.large_site.cap_for(total) {
        Some(cap) => size.min(cap).clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE),
        None => size,
    })
}

//! Sitemap generation.
//!
//! Documents are regenerated on every request from live store counts:
//!
//! | Path                                      | Document          |
//! |-------------------------------------------|-------------------|
//! | `/sitemap.xml`                            | sitemap index     |
//! | `/sitemap-post-type-{type}[-{page}].xml`  | one content page  |
//! | `/sitemap-taxonomy-{tax}[-{page}].xml`    | one taxonomy page |

mod generator;
mod pagination;
mod policy;
pub mod xml;

pub use generator::{Document, Generator};
pub use pagination::{Paginator, recommended_page_size};

/// What a sitemap listing enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    PostType,
    Taxonomy,
}

impl SitemapKind {
    /// Segment used in sitemap file names.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::PostType => "post-type",
            Self::Taxonomy => "taxonomy",
        }
    }
}

/// A single sitemap document a client can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapTarget {
    Index,
    Listing {
        kind: SitemapKind,
        name: String,
        page: u64,
    },
}

impl SitemapTarget {
    pub fn listing(kind: SitemapKind, name: impl Into<String>, page: u64) -> Self {
        Self::Listing {
            kind,
            name: name.into(),
            page,
        }
    }
}

/// `/sitemap-{kind}-{name}[-{page}].xml`
pub fn sitemap_path(kind: SitemapKind, name: &str, page: u64) -> String {
    if page <= 1 {
        format!("/sitemap-{}-{name}.xml", kind.slug())
    } else {
        format!("/sitemap-{}-{name}-{page}.xml", kind.slug())
    }
}

//! Sitemap document generation.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/hello/</loc>
//!     <lastmod>2025-01-01T00:00:00+00:00</lastmod>
//!     <changefreq>weekly</changefreq>
//!     <priority>0.6</priority>
//!   </url>
//! </urlset>
//! ```
//!
//! The index lists one `<sitemap>` per listing page instead.

use super::{
    SitemapKind, SitemapTarget,
    pagination::{Pagination, Paginator},
    policy::{EntryPolicy, Priority},
    xml::{SITEMAP_NS, XML_DECLARATION, error_document, escape},
};
use crate::config::{ChangeFreq, SiteConfig};
use crate::store::{ContentItem, ContentStore, ItemQuery, StoreResult, Term, TermQuery};
use chrono::{DateTime, SecondsFormat, Utc};

const POST_TYPE_NOT_FOUND: &str = "Post type does not exist";
const TAXONOMY_NOT_FOUND: &str = "Taxonomy does not exist";
const PAGE_OUT_OF_RANGE: &str = "Sitemap page out of range";

// ============================================================================
// Documents
// ============================================================================

/// A generated XML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Index(String),
    UrlSet(String),
    /// Unknown target; served with a 404.
    Error(String),
}

impl Document {
    pub fn error(message: &str) -> Self {
        Self::Error(error_document(message))
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub const fn status(&self) -> u16 {
        if self.is_error() { 404 } else { 200 }
    }

    pub fn body(&self) -> &str {
        match self {
            Self::Index(xml) | Self::UrlSet(xml) | Self::Error(xml) => xml,
        }
    }

    pub fn into_body(self) -> String {
        match self {
            Self::Index(xml) | Self::UrlSet(xml) | Self::Error(xml) => xml,
        }
    }
}

/// Single URL entry in a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlEntry {
    /// Absolute http(s) location
    pub loc: String,
    /// W3C datetime
    pub lastmod: String,
    pub changefreq: ChangeFreq,
    pub priority: Priority,
}

/// Single `<sitemap>` entry in the index
struct IndexEntry {
    loc: String,
    lastmod: Option<String>,
}

fn urlset_xml(urls: &[UrlEntry]) -> String {
    let mut xml = String::with_capacity(256 + urls.len() * 192);

    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in urls {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(&entry.loc)));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.changefreq.as_str()));
        xml.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

fn index_xml(sitemaps: &[IndexEntry]) -> String {
    let mut xml = String::with_capacity(256 + sitemaps.len() * 128);

    xml.push_str(XML_DECLARATION);
    xml.push('\n');
    xml.push_str(&format!(r#"<sitemapindex xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for entry in sitemaps {
        xml.push_str("  <sitemap>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(&entry.loc)));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
        }
        xml.push_str("  </sitemap>\n");
    }

    xml.push_str("</sitemapindex>\n");
    xml
}

/// `YYYY-MM-DDThh:mm:ss+00:00`
fn w3c(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, false)
}

// ============================================================================
// Generator
// ============================================================================

/// Builds sitemap documents from the store for one request.
///
/// "Now" is captured at construction and used for every missing timestamp,
/// so repeated calls on an unchanged store are byte-identical.
pub struct Generator<'a> {
    store: &'a dyn ContentStore,
    config: &'a SiteConfig,
    paginator: Paginator<'a>,
    policy: EntryPolicy<'a>,
    now: DateTime<Utc>,
}

impl<'a> Generator<'a> {
    pub fn new(store: &'a dyn ContentStore, config: &'a SiteConfig) -> StoreResult<Self> {
        Self::with_now(store, config, Utc::now())
    }

    pub fn with_now(
        store: &'a dyn ContentStore,
        config: &'a SiteConfig,
        now: DateTime<Utc>,
    ) -> StoreResult<Self> {
        Ok(Self {
            store,
            config,
            paginator: Paginator::new(store, config)?,
            policy: EntryPolicy::new(&config.sitemap),
            now,
        })
    }

    pub const fn paginator(&self) -> &Paginator<'a> {
        &self.paginator
    }

    pub fn store(&self) -> &'a dyn ContentStore {
        self.store
    }

    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn generate(&self, target: &SitemapTarget) -> StoreResult<Document> {
        match target {
            SitemapTarget::Index => self.generate_index(),
            SitemapTarget::Listing {
                kind: SitemapKind::PostType,
                name,
                page,
            } => self.generate_type_sitemap(name, *page),
            SitemapTarget::Listing {
                kind: SitemapKind::Taxonomy,
                name,
                page,
            } => self.generate_taxonomy_sitemap(name, *page),
        }
    }

    /// One `<sitemap>` per page of every indexed content type and taxonomy.
    pub fn generate_index(&self) -> StoreResult<Document> {
        let mut sitemaps = Vec::new();

        for name in self.paginator.indexed_post_types()? {
            let pagination = self.paginator.calculate(&name, SitemapKind::PostType)?;
            if pagination.total_pages == 0 {
                continue;
            }
            let lastmod = self.store.last_modified(&name)?.map(w3c);
            self.push_pages(&mut sitemaps, &name, SitemapKind::PostType, pagination, lastmod);
        }

        for name in self.paginator.indexed_taxonomies()? {
            let pagination = self.paginator.calculate(&name, SitemapKind::Taxonomy)?;
            self.push_pages(&mut sitemaps, &name, SitemapKind::Taxonomy, pagination, None);
        }

        Ok(Document::Index(index_xml(&sitemaps)))
    }

    fn push_pages(
        &self,
        sitemaps: &mut Vec<IndexEntry>,
        name: &str,
        kind: SitemapKind,
        pagination: Pagination,
        lastmod: Option<String>,
    ) {
        for page in 1..=pagination.total_pages {
            sitemaps.push(IndexEntry {
                loc: self.paginator.page_url(name, kind, page),
                lastmod: lastmod.clone(),
            });
        }
    }

    pub fn generate_type_sitemap(&self, name: &str, page: u64) -> StoreResult<Document> {
        if !self.store.content_type_exists(name)? {
            return Ok(Document::error(POST_TYPE_NOT_FOUND));
        }

        let pagination = self.paginator.calculate(name, SitemapKind::PostType)?;
        if !pagination.contains(page) {
            return Ok(Document::error(PAGE_OUT_OF_RANGE));
        }

        let slice = pagination.slice(page);
        let query = ItemQuery::published(name)
            .excluding(&self.config.sitemap.exclude_posts)
            .indexable()
            .page(slice.offset, slice.limit);

        let front_page = self.store.front_page()?;
        let urls: Vec<UrlEntry> = self
            .store
            .list_items(&query)?
            .iter()
            .filter_map(|item| self.item_entry(item, front_page))
            .collect();

        Ok(Document::UrlSet(urlset_xml(&urls)))
    }

    pub fn generate_taxonomy_sitemap(&self, name: &str, page: u64) -> StoreResult<Document> {
        if !self.store.taxonomy_exists(name)? {
            return Ok(Document::error(TAXONOMY_NOT_FOUND));
        }

        let pagination = self.paginator.calculate(name, SitemapKind::Taxonomy)?;
        if !pagination.contains(page) {
            return Ok(Document::error(PAGE_OUT_OF_RANGE));
        }

        let slice = pagination.slice(page);
        let terms = self
            .store
            .list_terms(&TermQuery::new(name, slice.offset, slice.limit))?;

        let mut urls = Vec::with_capacity(terms.len());
        for term in &terms {
            if let Some(entry) = self.term_entry(term)? {
                urls.push(entry);
            }
        }

        Ok(Document::UrlSet(urlset_xml(&urls)))
    }

    fn item_entry(&self, item: &ContentItem, front_page: Option<u64>) -> Option<UrlEntry> {
        let loc = self.resolve_loc(self.store.item_permalink(item)?)?;
        Some(UrlEntry {
            loc,
            lastmod: w3c(item.modified.unwrap_or(self.now)),
            changefreq: self.policy.changefreq(&item.content_type),
            priority: self.policy.priority(&item.content_type, item.id, front_page),
        })
    }

    fn term_entry(&self, term: &Term) -> StoreResult<Option<UrlEntry>> {
        let Some(loc) = self
            .store
            .term_permalink(term)
            .and_then(|link| self.resolve_loc(link))
        else {
            return Ok(None);
        };

        let lastmod = self.store.term_last_modified(term)?.unwrap_or(self.now);
        Ok(Some(UrlEntry {
            loc,
            lastmod: w3c(lastmod),
            changefreq: self.policy.taxonomy_changefreq(&term.taxonomy),
            priority: self.policy.taxonomy_priority(&term.taxonomy, term.count),
        }))
    }

    /// Absolute location for a permalink, if it resolves to an http(s) URL.
    fn resolve_loc(&self, link: String) -> Option<String> {
        let link = link.trim();
        if link.is_empty() {
            return None;
        }
        let url = self.config.base.resolve(link)?;
        (url.starts_with("http://") || url.starts_with("https://")).then_some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sitemap::xml::validate;
    use crate::store::{ItemStatus, MemoryStore};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn site() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.base.url = Some("https://example.com".into());
        config
    }

    fn post(id: u64, minutes: i64) -> ContentItem {
        ContentItem {
            id,
            content_type: "post".into(),
            status: ItemStatus::Publish,
            modified: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)),
            permalink: Some(format!("/post-{id}/")),
            noindex: false,
            password_protected: false,
            terms: Vec::new(),
        }
    }

    fn base_store() -> MemoryStore {
        MemoryStore::new()
            .with_content_type("post", true)
            .with_content_type("page", true)
            .with_content_type("attachment", true)
            .with_taxonomy("category", true)
            .with_taxonomy("post_tag", true)
    }

    fn locs(xml: &str) -> Vec<&str> {
        xml.split("<loc>")
            .skip(1)
            .filter_map(|s| s.split("</loc>").next())
            .collect()
    }

    #[test]
    fn test_urlset_entry_shape() {
        let mut store = base_store();
        store.push_item(post(1, 0));
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        let doc = generator.generate_type_sitemap("post", 1).unwrap();
        assert_eq!(doc.status(), 200);
        let xml = doc.body();
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains("<loc>https://example.com/post-1/</loc>"));
        assert!(xml.contains("<lastmod>2025-01-01T00:00:00+00:00</lastmod>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.contains("<priority>0.6</priority>"));
        assert_eq!(validate(xml).unwrap(), "urlset");
    }

    #[test]
    fn test_filtered_items_never_appear() {
        let mut store = base_store();
        for id in 1..=10 {
            store.push_item(post(id, id as i64));
        }
        store.items[0].password_protected = true;
        store.items[1].noindex = true;
        store.items[2].status = ItemStatus::Draft;
        let mut config = site();
        config.sitemap.exclude_posts.insert(4);

        let generator = Generator::with_now(&store, &config, now()).unwrap();
        let xml = generator.generate_type_sitemap("post", 1).unwrap().into_body();

        // 9 published, 3 of them flagged
        assert_eq!(xml.matches("<url>").count(), 6);
        for id in 1..=4 {
            assert!(!xml.contains(&format!("/post-{id}/")), "post {id} leaked");
        }
    }

    #[test]
    fn test_missing_permalink_skipped_and_relative_joined() {
        let mut store = base_store();
        let mut a = post(1, 0);
        a.permalink = None;
        let mut b = post(2, 1);
        b.permalink = Some("https://cdn.example.org/b/".into());
        let mut c = post(3, 2);
        c.permalink = Some("c/".into());
        store.push_item(a);
        store.push_item(b);
        store.push_item(c);
        let config = site();

        let generator = Generator::with_now(&store, &config, now()).unwrap();
        let xml = generator.generate_type_sitemap("post", 1).unwrap().into_body();
        assert_eq!(locs(&xml), vec!["https://example.com/c/", "https://cdn.example.org/b/"]);
    }

    #[test]
    fn test_foreign_scheme_permalinks_skipped() {
        let mut store = base_store();
        for (id, link) in [
            (1, "ftp://files.example.org/a"),
            (2, "//cdn.example.org/b/"),
            (3, "mailto:x@example.org"),
        ] {
            let mut item = post(id, id as i64);
            item.permalink = Some(link.into());
            store.push_item(item);
        }
        let config = site();

        let generator = Generator::with_now(&store, &config, now()).unwrap();
        let xml = generator.generate_type_sitemap("post", 1).unwrap().into_body();
        assert_eq!(locs(&xml), vec!["https://cdn.example.org/b/"]);
        validate(&xml).unwrap();
    }

    #[test]
    fn test_missing_modified_falls_back_to_now() {
        let mut store = base_store();
        let mut item = post(1, 0);
        item.modified = None;
        store.push_item(item);
        let config = site();

        let generator = Generator::with_now(&store, &config, now()).unwrap();
        let xml = generator.generate_type_sitemap("post", 1).unwrap().into_body();
        assert!(xml.contains("<lastmod>2025-06-01T12:00:00+00:00</lastmod>"));
    }

    #[test]
    fn test_front_page_priority() {
        let mut store = base_store();
        let mut home = post(7, 0);
        home.content_type = "page".into();
        store.push_item(home);
        store.front_page = Some(7);
        let config = site();

        let generator = Generator::with_now(&store, &config, now()).unwrap();
        let xml = generator.generate_type_sitemap("page", 1).unwrap().into_body();
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<changefreq>monthly</changefreq>"));
    }

    #[test]
    fn test_idempotent() {
        let mut store = base_store();
        for id in 1..=20 {
            let mut item = post(id, (id % 5) as i64);
            if id % 3 == 0 {
                item.modified = None;
            }
            store.push_item(item);
        }
        let config = site();

        let first = Generator::with_now(&store, &config, now()).unwrap();
        let second = Generator::with_now(&store, &config, now()).unwrap();
        assert_eq!(
            first.generate_type_sitemap("post", 1).unwrap(),
            second.generate_type_sitemap("post", 1).unwrap()
        );
        assert_eq!(first.generate_index().unwrap(), second.generate_index().unwrap());
    }

    #[test]
    fn test_unknown_targets_yield_error_document() {
        let store = base_store();
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        let doc = generator.generate_type_sitemap("nonexistent_type", 1).unwrap();
        assert!(doc.is_error());
        assert_eq!(doc.status(), 404);
        assert!(doc.body().contains("<message>Post type does not exist</message>"));
        assert_eq!(validate(doc.body()).unwrap(), "error");

        let doc = generator.generate_taxonomy_sitemap("genre", 1).unwrap();
        assert!(doc.body().contains("<message>Taxonomy does not exist</message>"));
    }

    #[test]
    fn test_page_out_of_range() {
        let mut store = base_store();
        store.push_item(post(1, 0));
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        for page in [0, 2] {
            let doc = generator.generate_type_sitemap("post", page).unwrap();
            assert!(doc.body().contains(PAGE_OUT_OF_RANGE));
        }

        // An existing but empty listing still answers page 1
        let doc = generator.generate_type_sitemap("page", 1).unwrap();
        assert!(!doc.is_error());
        assert_eq!(doc.body().matches("<url>").count(), 0);
    }

    #[test]
    fn test_taxonomy_sitemap() {
        let mut store = base_store();
        let mut tagged = post(1, 30);
        tagged.terms = vec![10];
        store.push_item(tagged);
        for (id, count, link) in [
            (10, 3, Some("/category/news/")),
            (11, 25, Some("/category/big/")),
            (12, 0, Some("/category/empty/")),
            (13, 1, None),
        ] {
            store.push_term(Term {
                id,
                taxonomy: "category".into(),
                name: format!("c{id}"),
                count,
                permalink: link.map(str::to_owned),
            });
        }
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        let xml = generator.generate_taxonomy_sitemap("category", 1).unwrap().into_body();
        assert_eq!(
            locs(&xml),
            vec!["https://example.com/category/big/", "https://example.com/category/news/"]
        );

        let big = xml.split("</url>").next().unwrap_or_default();
        assert!(big.contains("<priority>0.7</priority>"));
        assert!(big.contains("<lastmod>2025-06-01T12:00:00+00:00</lastmod>"));

        let news = xml.split("</url>").nth(1).unwrap_or_default();
        assert!(news.contains("<priority>0.6</priority>"));
        assert!(news.contains("<lastmod>2025-01-01T00:30:00+00:00</lastmod>"));
        assert!(news.contains("<changefreq>weekly</changefreq>"));
        validate(&xml).unwrap();
    }

    #[test]
    fn test_priorities_in_bounds() {
        let mut store = base_store();
        for id in 1..=5 {
            store.push_item(post(id, id as i64));
            store.push_term(Term {
                id,
                taxonomy: "post_tag".into(),
                name: format!("t{id}"),
                count: id * 7,
                permalink: Some(format!("/tag/t{id}/")),
            });
        }
        let mut config = site();
        config.sitemap.priority.insert("post".into(), 3.0);
        config.sitemap.taxonomy_priority.insert("post_tag".into(), 0.95);
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        for doc in [
            generator.generate_type_sitemap("post", 1).unwrap(),
            generator.generate_taxonomy_sitemap("post_tag", 1).unwrap(),
        ] {
            for value in doc.body().split("<priority>").skip(1) {
                let value: f32 = value.split('<').next().unwrap().parse().unwrap();
                assert!((0.0..=1.0).contains(&value), "priority {value} out of range");
            }
        }
    }

    #[test]
    fn test_index_lists_public_pages() {
        let mut store = base_store().with_content_type("revision", false);
        store.push_item(post(1, 5));
        let mut attachment = post(2, 0);
        attachment.content_type = "attachment".into();
        store.push_item(attachment);
        let mut revision = post(3, 0);
        revision.content_type = "revision".into();
        store.push_item(revision);
        store.push_term(Term {
            id: 1,
            taxonomy: "category".into(),
            name: "news".into(),
            count: 1,
            permalink: Some("/category/news/".into()),
        });
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        let doc = generator.generate_index().unwrap();
        let xml = doc.body();
        assert_eq!(validate(xml).unwrap(), "sitemapindex");
        assert_eq!(
            locs(xml),
            vec![
                "https://example.com/sitemap-post-type-post.xml",
                "https://example.com/sitemap-taxonomy-category.xml",
            ]
        );
        // Content types carry their newest modification, taxonomies none
        assert_eq!(xml.matches("<lastmod>").count(), 1);
        assert!(xml.contains("<lastmod>2025-01-01T00:05:00+00:00</lastmod>"));
    }

    #[test]
    fn test_large_listing_pages() {
        let mut store = base_store();
        for id in 1..=2500u64 {
            store.push_item(post(id, id as i64));
        }
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        let pagination = generator
            .paginator()
            .calculate("post", SitemapKind::PostType)
            .unwrap();
        assert_eq!(pagination.page_size, 1000);
        assert_eq!(pagination.total_pages, 3);

        // Newest first: offsets 1000..2000 are ids 1500 down to 501
        let xml = generator.generate_type_sitemap("post", 2).unwrap().into_body();
        let expected: Vec<String> = (501..=1500u64)
            .rev()
            .map(|id| format!("https://example.com/post-{id}/"))
            .collect();
        assert_eq!(locs(&xml), expected);

        let index = generator.generate_index().unwrap().into_body();
        assert_eq!(
            locs(&index),
            vec![
                "https://example.com/sitemap-post-type-post.xml",
                "https://example.com/sitemap-post-type-post-2.xml",
                "https://example.com/sitemap-post-type-post-3.xml",
            ]
        );
    }

    #[test]
    fn test_generate_dispatch() {
        let mut store = base_store();
        store.push_item(post(1, 0));
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        assert!(matches!(
            generator.generate(&SitemapTarget::Index).unwrap(),
            Document::Index(_)
        ));
        assert!(matches!(
            generator
                .generate(&SitemapTarget::listing(SitemapKind::PostType, "post", 1))
                .unwrap(),
            Document::UrlSet(_)
        ));
        assert!(
            generator
                .generate(&SitemapTarget::listing(SitemapKind::Taxonomy, "genre", 1))
                .unwrap()
                .is_error()
        );
    }

    #[test]
    fn test_loc_is_escaped() {
        let mut store = base_store();
        let mut item = post(1, 0);
        item.permalink = Some("/search/?a=1&b=2".into());
        store.push_item(item);
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        let xml = generator.generate_type_sitemap("post", 1).unwrap().into_body();
        assert!(xml.contains("<loc>https://example.com/search/?a=1&amp;b=2</loc>"));
        validate(&xml).unwrap();
    }
}

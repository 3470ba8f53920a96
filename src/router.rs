//! Request routing for sitemap paths.
//!
//! Maps a request path to a [`SitemapTarget`], runs the generator, and
//! wraps the document in a status code and cache headers. Transport is
//! left to the caller (`serve` or `render`).

use crate::{
    sitemap::{Document, Generator, SitemapKind, SitemapTarget},
    store::{ContentStore, StoreResult},
};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;

pub const CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Public cache lifetime in seconds.
const MAX_AGE: i64 = 3600;

const NOT_FOUND: &str = "Sitemap not found";

static RE_LISTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^sitemap-(post-type|taxonomy)-([^./]+?)(?:-([0-9]+))?\.xml$")
        .expect("listing pattern is valid")
});

// ============================================================================
// Routes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `suffixed` is set when the page number came from a `-{page}` suffix.
    Sitemap { target: SitemapTarget, suffixed: bool },
    /// Permanent redirect to the slash-less path.
    Redirect(String),
    NotFound,
}

/// Parse a request path. The query string must already be stripped.
pub fn parse(path: &str) -> Route {
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        return match parse(trimmed) {
            Route::Sitemap { .. } => Route::Redirect(ensure_leading_slash(trimmed)),
            _ => Route::NotFound,
        };
    }

    let file = path.trim_start_matches('/');
    if file == "sitemap.xml" {
        return Route::Sitemap {
            target: SitemapTarget::Index,
            suffixed: false,
        };
    }

    let Some(caps) = RE_LISTING.captures(file) else {
        return Route::NotFound;
    };
    let kind = match &caps[1] {
        "taxonomy" => SitemapKind::Taxonomy,
        _ => SitemapKind::PostType,
    };
    let (page, suffixed) = match caps.get(3) {
        Some(m) => match m.as_str().parse::<u64>() {
            Ok(page) => (page, true),
            Err(_) => return Route::NotFound,
        },
        None => (1, false),
    };

    Route::Sitemap {
        target: SitemapTarget::listing(kind, &caps[2], page),
        suffixed,
    }
}

fn ensure_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// Reinterpret `{name}-{page}` as a whole name when only that name exists.
pub fn disambiguate(
    store: &dyn ContentStore,
    target: SitemapTarget,
    suffixed: bool,
) -> StoreResult<SitemapTarget> {
    let SitemapTarget::Listing { kind, name, page } = &target else {
        return Ok(target);
    };
    if !suffixed || exists(store, *kind, name)? {
        return Ok(target);
    }

    let whole = format!("{name}-{page}");
    if exists(store, *kind, &whole)? {
        return Ok(SitemapTarget::listing(*kind, whole, 1));
    }
    Ok(target)
}

fn exists(store: &dyn ContentStore, kind: SitemapKind, name: &str) -> StoreResult<bool> {
    match kind {
        SitemapKind::PostType => store.content_type_exists(name),
        SitemapKind::Taxonomy => store.taxonomy_exists(name),
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn xml(status: u16, body: String, debug: bool, now: DateTime<Utc>) -> Self {
        let mut headers = vec![("Content-Type", CONTENT_TYPE.to_owned())];
        headers.extend(cache_headers(debug, now));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Plain-text 500, sent when the store cannot be read.
    pub fn internal_error() -> Self {
        Self {
            status: 500,
            headers: vec![("Content-Type", "text/plain".to_owned())],
            body: "500 Internal Server Error".to_owned(),
        }
    }

    fn redirect(location: String) -> Self {
        Self {
            status: 301,
            headers: vec![("Location", location)],
            body: String::new(),
        }
    }
}

/// `no-cache` in debug mode, otherwise one hour of public caching.
pub fn cache_headers(debug: bool, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
    if debug {
        vec![
            ("Cache-Control", "no-cache, no-store, must-revalidate".to_owned()),
            ("Pragma", "no-cache".to_owned()),
            ("Expires", "0".to_owned()),
        ]
    } else {
        let expires = now + Duration::seconds(MAX_AGE);
        vec![
            ("Cache-Control", format!("public, max-age={MAX_AGE}")),
            ("Expires", expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string()),
        ]
    }
}

/// Route `path` and render the response. Store failures propagate.
pub fn respond(generator: &Generator, path: &str, debug: bool) -> StoreResult<Response> {
    let now = generator.now();
    match parse(path) {
        Route::Redirect(location) => Ok(Response::redirect(location)),
        Route::NotFound => Ok(Response::xml(
            404,
            Document::error(NOT_FOUND).into_body(),
            debug,
            now,
        )),
        Route::Sitemap { target, suffixed } => {
            let target = disambiguate(generator.store(), target, suffixed)?;
            let document = generator.generate(&target)?;
            Ok(Response::xml(document.status(), document.into_body(), debug, now))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::store::{ContentItem, FailingStore, ItemStatus, MemoryStore, StoreError};
    use chrono::TimeZone;

    fn listing(kind: SitemapKind, name: &str, page: u64, suffixed: bool) -> Route {
        Route::Sitemap {
            target: SitemapTarget::listing(kind, name, page),
            suffixed,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn site() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.base.url = Some("https://example.com".into());
        config
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new()
            .with_content_type("post", true)
            .with_content_type("news-2", true)
            .with_taxonomy("category", true);
        store.push_item(ContentItem {
            id: 1,
            content_type: "news-2".into(),
            status: ItemStatus::Publish,
            modified: None,
            permalink: Some("/news/one/".into()),
            noindex: false,
            password_protected: false,
            terms: Vec::new(),
        });
        store
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(
            parse("/sitemap.xml"),
            Route::Sitemap {
                target: SitemapTarget::Index,
                suffixed: false
            }
        );
        assert_eq!(parse("sitemap.xml"), parse("/sitemap.xml"));
    }

    #[test]
    fn test_parse_listings() {
        assert_eq!(
            parse("/sitemap-post-type-post.xml"),
            listing(SitemapKind::PostType, "post", 1, false)
        );
        assert_eq!(
            parse("/sitemap-post-type-post-3.xml"),
            listing(SitemapKind::PostType, "post", 3, true)
        );
        assert_eq!(
            parse("/sitemap-taxonomy-post_tag.xml"),
            listing(SitemapKind::Taxonomy, "post_tag", 1, false)
        );
        assert_eq!(
            parse("/sitemap-taxonomy-product_cat-12.xml"),
            listing(SitemapKind::Taxonomy, "product_cat", 12, true)
        );
        assert_eq!(
            parse("/sitemap-post-type-my-type.xml"),
            listing(SitemapKind::PostType, "my-type", 1, false)
        );
    }

    #[test]
    fn test_parse_not_found() {
        for path in [
            "/",
            "/robots.txt",
            "/sitemap.xml.gz",
            "/sitemap-post-type-.xml",
            "/sitemap-user-admin.xml",
            "/blog/sitemap.xml",
            "/sitemap-post-type-post-99999999999999999999999.xml",
        ] {
            assert_eq!(parse(path), Route::NotFound, "{path}");
        }
    }

    #[test]
    fn test_parse_trailing_slash_redirects() {
        assert_eq!(
            parse("/sitemap.xml/"),
            Route::Redirect("/sitemap.xml".into())
        );
        assert_eq!(
            parse("/sitemap-post-type-post-2.xml/"),
            Route::Redirect("/sitemap-post-type-post-2.xml".into())
        );
        assert_eq!(parse("/about/"), Route::NotFound);
    }

    #[test]
    fn test_disambiguate_hyphenated_name() {
        let store = store();

        let target = SitemapTarget::listing(SitemapKind::PostType, "news", 2);
        assert_eq!(
            disambiguate(&store, target, true).unwrap(),
            SitemapTarget::listing(SitemapKind::PostType, "news-2", 1)
        );

        // Existing paged names are left alone
        let target = SitemapTarget::listing(SitemapKind::PostType, "post", 2);
        assert_eq!(disambiguate(&store, target.clone(), true).unwrap(), target);

        // No suffix in the path, nothing to reinterpret
        let target = SitemapTarget::listing(SitemapKind::PostType, "news", 2);
        assert_eq!(disambiguate(&store, target.clone(), false).unwrap(), target);
    }

    #[test]
    fn test_respond_index() {
        let store = store();
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        let response = respond(&generator, "/sitemap.xml", false).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.header("content-type"), Some(CONTENT_TYPE));
        assert!(response.body.contains("<sitemapindex"));
        assert!(
            response
                .body
                .contains("<loc>https://example.com/sitemap-post-type-news-2.xml</loc>")
        );
    }

    #[test]
    fn test_respond_hyphenated_type() {
        let store = store();
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        let response = respond(&generator, "/sitemap-post-type-news-2.xml", false).unwrap();
        assert_eq!(response.status, 200);
        assert!(response.body.contains("<loc>https://example.com/news/one/</loc>"));
    }

    #[test]
    fn test_respond_unknown_type_is_404() {
        let store = store();
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        let response = respond(&generator, "/sitemap-post-type-nonexistent_type.xml", false).unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.header("Content-Type"), Some(CONTENT_TYPE));
        assert!(response.body.contains("<error>"));

        let response = respond(&generator, "/feed.xml", false).unwrap();
        assert_eq!(response.status, 404);
        assert!(response.body.contains("<message>Sitemap not found</message>"));
    }

    #[test]
    fn test_respond_propagates_store_failure() {
        let config = site();
        let generator = Generator::with_now(&FailingStore, &config, now()).unwrap();

        for path in ["/sitemap.xml", "/sitemap-post-type-post.xml", "/sitemap-taxonomy-category-2.xml"] {
            let err = respond(&generator, path, false).unwrap_err();
            assert!(matches!(err, StoreError::InvalidData(_)), "{path}");
        }
        // Redirects and unknown paths are answered without the store
        assert_eq!(respond(&generator, "/sitemap.xml/", false).unwrap().status, 301);
        assert_eq!(respond(&generator, "/feed.xml", false).unwrap().status, 404);
    }

    #[test]
    fn test_respond_redirect() {
        let store = store();
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        let response = respond(&generator, "/sitemap.xml/", false).unwrap();
        assert_eq!(response.status, 301);
        assert_eq!(response.header("Location"), Some("/sitemap.xml"));
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_cache_headers() {
        let store = store();
        let config = site();
        let generator = Generator::with_now(&store, &config, now()).unwrap();

        let response = respond(&generator, "/sitemap.xml", false).unwrap();
        assert_eq!(response.header("Cache-Control"), Some("public, max-age=3600"));
        assert_eq!(response.header("Expires"), Some("Sun, 01 Jun 2025 13:00:00 GMT"));
        assert_eq!(response.header("Pragma"), None);

        let response = respond(&generator, "/sitemap.xml", true).unwrap();
        assert_eq!(
            response.header("Cache-Control"),
            Some("no-cache, no-store, must-revalidate")
        );
        assert_eq!(response.header("Pragma"), Some("no-cache"));
        assert_eq!(response.header("Expires"), Some("0"));
    }
}

//! `[base]` section configuration.
//!
//! Contains basic site information used to build absolute sitemap URLs.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in seomap.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "My Shop"
/// url = "https://shop.example.com"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title, used in log output only.
    #[serde(default = "defaults::base::title")]
    #[educe(Default = defaults::base::title())]
    pub title: String,

    /// Home URL. Sitemap locations and relative permalinks are joined onto it.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,
}

impl BaseConfig {
    /// Home URL without a trailing slash, empty when unset.
    pub fn home(&self) -> &str {
        self.url.as_deref().unwrap_or_default().trim_end_matches('/')
    }

    /// Join a site-relative path onto the home URL.
    ///
    /// Absolute `http(s)` links are returned unchanged.
    pub fn absolute(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            return link.to_owned();
        }
        format!("{}/{}", self.home(), link.trim_start_matches('/'))
    }

    /// Resolve a permalink to an absolute URL.
    ///
    /// Protocol-relative links take the scheme of the home URL. Links with
    /// any other scheme (`ftp:`, `mailto:`) resolve to `None`.
    pub fn resolve(&self, link: &str) -> Option<String> {
        if let Some(rest) = link.strip_prefix("//") {
            let scheme = self.home().split_once("://").map_or("https", |(scheme, _)| scheme);
            return Some(format!("{scheme}://{rest}"));
        }
        if has_scheme(link) && !link.starts_with("http://") && !link.starts_with("https://") {
            return None;
        }
        Some(self.absolute(link))
    }
}

/// Whether `link` starts with an RFC 3986 `scheme:`
fn has_scheme(link: &str) -> bool {
    link.split_once(':').is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

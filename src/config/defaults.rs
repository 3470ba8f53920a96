//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn title() -> String {
        "My Site".into()
    }
}

// ============================================================================
// [sitemap] Section Defaults
// ============================================================================

pub mod sitemap {
    pub fn posts_per_page() -> i64 {
        1000
    }

    pub fn exclude_post_types() -> Vec<String> {
        vec!["attachment".into()]
    }

    pub mod large_site {
        use crate::config::sitemap::PageSizeTier;

        pub fn tiers() -> Vec<PageSizeTier> {
            vec![
                PageSizeTier {
                    above: 10_000,
                    max_per_page: 500,
                },
                PageSizeTier {
                    above: 50_000,
                    max_per_page: 250,
                },
            ]
        }
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5277
    }
}

// ============================================================================
// [store] Section Defaults
// ============================================================================

pub mod store {
    use super::super::StoreBackend;
    use std::path::PathBuf;

    pub fn backend() -> StoreBackend {
        StoreBackend::Sqlite
    }

    pub fn path() -> PathBuf {
        "content.db".into()
    }
}

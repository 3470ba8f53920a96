//! Site configuration management for `seomap.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                            |
//! |-------------|----------------------------------------------------|
//! | `[base]`    | Site metadata (title, home url)                    |
//! | `[sitemap]` | Page size, exclusions, changefreq/priority tables  |
//! | `[serve]`   | HTTP server (interface, port, debug headers)       |
//! | `[store]`   | Content store backend and path                     |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Shop"
//! url = "https://shop.example.com"
//!
//! [sitemap]
//! posts_per_page = 1000
//! exclude_posts = [42]
//!
//! [serve]
//! port = 5277
//!
//! [store]
//! backend = "sqlite"
//! path = "content.db"
//! ```
//!
//! The config is loaded once in `main` and handed to every collaborator
//! by reference.

mod base;
pub mod defaults;
mod error;
mod serve;
mod sitemap;
mod store;

pub use error::ConfigError;
pub use sitemap::{ChangeFreq, MAX_PAGE_SIZE, MIN_PAGE_SIZE, SitemapConfig};
#[cfg(test)]
pub use sitemap::PageSizeTier;
pub use store::StoreBackend;

use base::BaseConfig;
use serve::ServeConfig;
use store::StoreConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing seomap.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Sitemap generation settings
    #[serde(default)]
    pub sitemap: SitemapConfig,

    /// HTTP server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Content store settings
    #[serde(default)]
    pub store: StoreConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load from the CLI's root and config arguments, falling back to defaults
    /// when the file is missing.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        Ok(config)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = Self::normalize_path(cli.root.as_deref().unwrap_or(Path::new("./")));
        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.store.path = Self::normalize_path(&root.join(&self.store.path));
        self.root = root;

        if let Some(url) = &cli.base_url {
            self.base.url = Some(url.clone());
        }

        if let Commands::Serve {
            interface,
            port,
            debug,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.debug, debug.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before generating sitemaps.
    pub fn validate(&self) -> Result<()> {
        if !self.config_path.exists() {
            bail!("Config file not found. Run `seomap init` first.");
        }

        match &self.base.url {
            None => bail!(ConfigError::Validation(
                "[base.url] is required for sitemap generation".into()
            )),
            Some(url) if !url.starts_with("http") => bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            )),
            _ => {}
        }

        for tier in &self.sitemap.large_site.tiers {
            if tier.max_per_page == 0 {
                bail!(ConfigError::Validation(
                    "[sitemap.large_site.tiers] max_per_page must be positive".into()
                ));
            }
        }

        if !self.store.path.exists() {
            bail!(ConfigError::Validation(format!(
                "[store.path] `{}` not found",
                self.store.path.display()
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

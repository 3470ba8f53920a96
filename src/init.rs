//! Project initialization.
//!
//! Writes a default `seomap.toml` and creates a content store seeded with
//! the usual content types and taxonomies.

use crate::{
    config::{SiteConfig, StoreBackend},
    log,
    store::{MemoryStore, SqliteStore},
};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Placeholder written when no `--base-url` was given
const PLACEHOLDER_URL: &str = "https://example.com";

/// `(name, public)` content types registered in a fresh store
const CONTENT_TYPES: &[(&str, bool)] = &[
    ("post", true),
    ("page", true),
    ("attachment", true),
    ("revision", false),
    ("nav_menu_item", false),
];

/// `(name, public)` taxonomies registered in a fresh store
const TAXONOMIES: &[(&str, bool)] = &[
    ("category", true),
    ("post_tag", true),
    ("nav_menu", false),
];

/// Create config and store for a new project.
pub fn new_project(config: &SiteConfig) -> Result<()> {
    if config.config_path.exists() {
        bail!(
            "Config file `{}` already exists. Remove it manually or init in a different path.",
            config.config_path.display()
        );
    }

    fs::create_dir_all(&config.root)
        .with_context(|| format!("Failed to create {}", config.root.display()))?;

    init_default_config(config)?;
    init_store(config)?;

    log!("init"; "created {}", config.config_path.display());
    Ok(())
}

/// Write default configuration file, keeping a `--base-url` override.
fn init_default_config(config: &SiteConfig) -> Result<()> {
    let mut template = SiteConfig::default();
    template.base.url = Some(
        config
            .base
            .url
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_URL.to_owned()),
    );
    template.store.backend = config.store.backend;

    let content = toml::to_string_pretty(&template).context("Failed to serialize default config")?;
    fs::write(&config.config_path, content)
        .with_context(|| format!("Failed to write {}", config.config_path.display()))?;
    Ok(())
}

/// Create the content store unless one already exists at `[store.path]`.
fn init_store(config: &SiteConfig) -> Result<()> {
    let path = &config.store.path;
    if path.exists() {
        log!("init"; "keeping existing store {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    match config.store.backend {
        StoreBackend::Sqlite => init_sqlite(path),
        StoreBackend::Json => init_json(path),
    }?;

    log!("init"; "created store {}", path.display());
    Ok(())
}

fn init_sqlite(path: &Path) -> Result<()> {
    let store = SqliteStore::open(path)?;
    for (name, public) in CONTENT_TYPES {
        store.insert_content_type(name, *public)?;
    }
    for (name, public) in TAXONOMIES {
        store.insert_taxonomy(name, *public)?;
    }
    Ok(())
}

fn init_json(path: &Path) -> Result<()> {
    let store = CONTENT_TYPES
        .iter()
        .fold(MemoryStore::new(), |store, (name, public)| {
            store.with_content_type(name, *public)
        });
    let store = TAXONOMIES
        .iter()
        .fold(store, |store, (name, public)| store.with_taxonomy(name, *public));

    let content = serde_json::to_string_pretty(&store).context("Failed to serialize store")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

//! seomap - a paginated sitemap server for content stores.

mod cli;
mod config;
mod init;
mod logger;
mod router;
mod serve;
mod sitemap;
mod store;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use init::new_project;
use serve::serve_sitemaps;
use sitemap::{Generator, Paginator, SitemapKind, SitemapTarget, recommended_page_size, xml};
use std::{fs, path::Path};
use store::ContentStore;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Init => new_project(&config),
        Commands::Serve { .. } => {
            let store = store::open(&config)?;
            serve_sitemaps(&config, store.as_ref())
        }
        Commands::Render {
            path,
            check,
            output,
        } => {
            let store = store::open(&config)?;
            render(&config, store.as_ref(), path, *check, output.as_deref())
        }
        Commands::Stats => {
            let store = store::open(&config)?;
            print_stats(&config, store.as_ref())
        }
    }
}

/// Load configuration and validate it for every command but `init`.
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let config = SiteConfig::load(cli)?;
    if !cli.is_init() {
        config.validate()?;
    }
    Ok(config)
}

/// Render one sitemap path to stdout or a file.
fn render(
    config: &SiteConfig,
    store: &dyn ContentStore,
    path: &str,
    check: bool,
    output: Option<&Path>,
) -> Result<()> {
    let generator = Generator::new(store, config)?;
    let response = router::respond(&generator, path, config.serve.debug)?;

    if let Some(location) = response.header("Location") {
        bail!("`{path}` redirects to `{location}`");
    }
    let root = if check {
        let root = xml::validate(&response.body)
            .with_context(|| format!("`{path}` is not well-formed"))?;
        Some(root)
    } else {
        None
    };

    // Logs go to stdout too, so only report when the body goes to a file
    match output {
        Some(file) => {
            fs::write(file, &response.body)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            log!("render"; "{} -> {}", path, file.display());
            if let Some(root) = root {
                log!("render"; "well-formed <{root}>");
            }
            log_page_info(&generator, path)?;
        }
        None => print!("{}", response.body),
    }

    if response.status != 200 {
        bail!("`{path}` answered {}", response.status);
    }
    Ok(())
}

/// Log the position of a listing page within its sitemap.
fn log_page_info(generator: &Generator, path: &str) -> Result<()> {
    let router::Route::Sitemap { target, suffixed } = router::parse(path) else {
        return Ok(());
    };
    let SitemapTarget::Listing { kind, name, page } =
        router::disambiguate(generator.store(), target, suffixed)?
    else {
        return Ok(());
    };

    let paginator = generator.paginator();
    if !paginator.is_valid_page(&name, kind, page)? {
        log!("render"; "page {page} is outside {name}");
        return Ok(());
    }

    let info = paginator.page_info(&name, kind, page)?;
    log!(
        "render";
        "page {}/{}, items {}-{} of {}",
        info.page,
        info.total_pages,
        info.start_item,
        info.end_item,
        info.total_items
    );
    // Both URLs are set for a valid page that has a neighbour
    if info.has_previous {
        log!("render"; "previous {}", info.previous_url.as_deref().unwrap_or_default());
    }
    if info.has_next {
        log!("render"; "next {}", info.next_url.as_deref().unwrap_or_default());
    }
    Ok(())
}

/// Print pagination of every indexed listing.
fn print_stats(config: &SiteConfig, store: &dyn ContentStore) -> Result<()> {
    let paginator = Paginator::new(store, config)?;
    let stats = paginator.stats()?;

    log!("stats"; "page size {}", stats.page_size);
    for (name, pagination) in &stats.post_types {
        log!(
            "stats";
            "post-type {name}: {} items, {} pages",
            pagination.total_items,
            pagination.total_pages
        );
        log_page_urls(&paginator, name, SitemapKind::PostType)?;
    }
    for (name, pagination) in &stats.taxonomies {
        log!(
            "stats";
            "taxonomy {name}: {} terms, {} pages",
            pagination.total_items,
            pagination.total_pages
        );
        log_page_urls(&paginator, name, SitemapKind::Taxonomy)?;
    }
    log!(
        "stats";
        "{} sitemaps, {} urls",
        stats.total_sitemaps(),
        stats.total_urls()
    );

    let recommended = recommended_page_size(stats.total_published());
    if recommended != stats.page_size {
        log!(
            "stats";
            "recommended page size for {} items: {}",
            stats.total_published(),
            recommended
        );
    }
    Ok(())
}

/// Log every page URL of a paginated listing.
fn log_page_urls(paginator: &Paginator, name: &str, kind: SitemapKind) -> Result<()> {
    for page in paginator.page_urls(name, kind)? {
        if page.is_first && page.is_last {
            break;
        }
        log!("stats"; "  {}", page.url);
    }
    Ok(())
}

//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// seomap sitemap server CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: seomap.toml)
    #[arg(short = 'C', long, default_value = "seomap.toml")]
    pub config: PathBuf,

    /// Override base URL for the site.
    ///
    /// Useful when the public URL differs from the one in seomap.toml,
    /// e.g. when serving a staging copy of the store:
    ///   seomap serve --base-url "https://staging.example.com"
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a default config and create an empty SQLite content store
    Init,

    /// Serve sitemaps over HTTP
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,

        /// Send no-cache headers instead of a one hour max-age
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        debug: Option<bool>,
    },

    /// Render one sitemap path (e.g. /sitemap-post-type-post-2.xml) to stdout
    Render {
        /// Request path to render
        path: String,

        /// Check that the output is well-formed XML
        #[arg(long)]
        check: bool,

        /// Write the document to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print pagination statistics for every public type and taxonomy
    Stats,
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init)
    }
}

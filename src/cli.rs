//! Command-line interface definitions.
//!
//! Every compiler stage is a standalone subcommand; `build` runs them all.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sitegate - SEO artifact compiler and edge route gate
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: sitegate.toml)
    #[arg(short = 'C', long, default_value = crate::config::CONFIG_FILE)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Discover routes in the page tree and print them
    Routes,

    /// Compile the page manifest
    Manifest,

    /// Compile the sitemap index and its sub-documents
    Sitemap,

    /// Compile robots.txt
    Robots,

    /// Run every stage: manifest, sitemaps and robots.txt
    Build,

    /// Re-read the generated artifacts and check their invariants
    Verify,

    /// Print the gate decision for a request path
    Check {
        /// Request path, e.g. `/admin/settings`
        path: String,

        /// Admin bearer token presented with the request
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Print the `[gate.auth] token_hash` digest for an admin token
    HashToken {
        /// Bearer token issued to admins
        token: String,
    },

    /// Serve the output directory behind the route gate
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,
    },
}

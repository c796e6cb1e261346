//! sitegate - SEO artifact compiler and edge route gate for a
//! content-managed marketing site.

mod build;
mod cli;
mod compiler;
mod config;
mod discovery;
mod gate;
mod logger;
mod seo;
mod serve;
mod utils;
mod watch;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use serve::serve_site;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static SiteConfig = Box::leak(Box::new(SiteConfig::load(cli)?));

    match &cli.command {
        Commands::Routes => build::print_routes(config),
        Commands::Manifest => build::build_manifest(config),
        Commands::Sitemap => build::build_sitemap(config),
        Commands::Robots => build::build_robots(config),
        Commands::Build => build::build_all(config).map(|_| ()),
        Commands::Verify => build::verify(config).map(|_| ()),
        Commands::Check { path, token } => {
            build::check_path(config, path, token.as_deref()).map(|_| ())
        }
        Commands::HashToken { token } => {
            println!("{}", gate::BlakeTokenVerifier::digest(token));
            Ok(())
        }
        Commands::Serve { .. } => {
            build::build_all(config)?;
            serve_site(config)
        }
    }
}

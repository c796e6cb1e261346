//! Site configuration management for `sitegate.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[site]`    | Global SEO defaults (name, url, title template)  |
//! | `[sitemap]` | Sitemap priorities, frequencies, collections     |
//! | `[robots]`  | Disallowed path prefixes                         |
//! | `[build]`   | Page tree, content and output paths              |
//! | `[gate]`    | Edge route gate prefixes and admin auth          |
//! | `[serve]`   | Gate preview server (port, interface, watch)     |
//!
//! # Example
//!
//! ```toml
//! [site]
//! name = "Acme"
//! url = "https://acme.dev"
//! title_template = "%s | Acme"
//!
//! [build]
//! pages = "app"
//! output = "public"
//!
//! [gate.auth]
//! token_hash = "..."
//! ```
//!
//! The loaded config is an immutable snapshot: it is read once at the start
//! of a run and passed by reference into every stage.

mod build;
pub mod defaults;
mod error;
mod gate;
mod serve;
mod site;
mod sitemap;

pub use gate::{DISABLE_AUTH_ENV, GateSection};
pub use site::TITLE_PLACEHOLDER;

use build::BuildSection;
use error::ConfigError;
use serve::ServeConfig;
use site::SiteSection;
use sitemap::{RobotsSection, SitemapSection};

use crate::{
    cli::{Cli, Commands},
    utils::date::parse_lastmod,
};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name.
pub const CONFIG_FILE: &str = "sitegate.toml";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing sitegate.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Global SEO defaults
    #[serde(default)]
    pub site: SiteSection,

    /// Sitemap defaults
    #[serde(default)]
    pub sitemap: SitemapSection,

    /// Robots document template
    #[serde(default)]
    pub robots: RobotsSection,

    /// Build paths
    #[serde(default)]
    pub build: BuildSection,

    /// Edge route gate
    #[serde(default)]
    pub gate: GateSection,

    /// Gate preview server
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load, anchor and validate configuration for a CLI invocation.
    ///
    /// A missing config file is not an error: every section has defaults.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.config_path = normalize_path(&config_path);
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Absolute path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.build.output.join(&self.build.manifest)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        self.update_path_with_root(&root);

        if let Commands::Serve { interface, port } = &cli.command {
            update_option(&mut self.serve.interface, interface.as_ref());
            update_option(&mut self.serve.port, port.as_ref());
        }
    }

    /// Anchor all paths at the root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path) {
        let root = normalize_path(root);
        self.build.pages = normalize_path(&root.join(&self.build.pages));
        self.build.content = normalize_path(&root.join(&self.build.content));
        self.build.output = normalize_path(&root.join(&self.build.output));
        self.build.root = Some(root);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.site.url.starts_with("http") {
            bail!(ConfigError::Validation(
                "[site.url] must start with http:// or https://".into()
            ));
        }

        if !self.site.title_template.contains(TITLE_PLACEHOLDER) {
            bail!(ConfigError::Validation(format!(
                "[site.title_template] must contain `{TITLE_PLACEHOLDER}`"
            )));
        }

        for (field, value) in [
            ("[sitemap.home_priority]", self.sitemap.home_priority),
            ("[sitemap.page_priority]", self.sitemap.page_priority),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!(ConfigError::Validation(format!(
                    "{field} must be within 0.0..=1.0, got {value}"
                )));
            }
        }

        if let Some(name) = self
            .sitemap
            .collections
            .iter()
            .find(|name| name.is_empty() || name.as_str() == "pages" || name.contains(['/', '.']))
        {
            bail!(ConfigError::Validation(format!(
                "[sitemap.collections] contains invalid name `{name}`"
            )));
        }

        if let Some(date) = &self.sitemap.default_lastmod
            && parse_lastmod(date).is_none()
        {
            bail!(ConfigError::Validation(format!(
                "[sitemap.default_lastmod] is not a date: `{date}`"
            )));
        }

        if let Some(hash) = &self.gate.auth.token_hash
            && (hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()))
        {
            bail!(ConfigError::Validation(
                "[gate.auth.token_hash] must be a 64-character hex digest".into()
            ));
        }

        self.serve.interface_addr()?;

        Ok(())
    }
}

/// Update config option if CLI value is provided
fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
    if let Some(option) = cli_option {
        *config_option = option.clone();
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        // For non-existent paths, manually make them absolute
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn parse(content: &str) -> SiteConfig {
        SiteConfig::from_str(content).unwrap()
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = parse("");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_relative_url() {
        let config = parse(
            r#"
            [site]
            url = "acme.dev"
        "#,
        );
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("[site.url]"));
    }

    #[test]
    fn test_validate_rejects_template_without_placeholder() {
        let config = parse(
            r#"
            [site]
            title_template = "Acme"
        "#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_priority() {
        let config = parse(
            r#"
            [sitemap]
            page_priority = 1.5
        "#,
        );
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("[sitemap.page_priority]"));
    }

    #[test]
    fn test_validate_rejects_reserved_collection_name() {
        let config = parse(
            r#"
            [sitemap]
            collections = ["pages"]
        "#,
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_default_lastmod() {
        let bad = parse("[sitemap]\ndefault_lastmod = \"last week\"\n");
        let err = bad.validate().unwrap_err().to_string();
        assert!(err.contains("[sitemap.default_lastmod]"));

        let good = parse("[sitemap]\ndefault_lastmod = \"2025-01-01T00:00:00Z\"\n");
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_validate_token_hash() {
        let bad = parse(
            r#"
            [gate.auth]
            token_hash = "abc"
        "#,
        );
        assert!(bad.validate().is_err());

        let good = format!(
            "[gate.auth]\ntoken_hash = \"{}\"\n",
            blake3::hash(b"secret").to_hex()
        );
        assert!(parse(&good).validate().is_ok());
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(SiteConfig::from_str("[deploy]\nforce = true\n").is_err());
    }

    #[test]
    fn test_load_anchors_paths_at_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[build]\npages = \"src/app\"\n",
        )
        .unwrap();

        let root = dir.path().to_str().unwrap();
        let cli = Cli::parse_from(["sitegate", "--root", root, "routes"]);
        let config = SiteConfig::load(&cli).unwrap();

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.build.pages, root.join("src/app"));
        assert_eq!(config.build.output, root.join("public"));
        assert_eq!(config.manifest_path(), root.join("public/site-manifest.json"));
    }

    #[test]
    fn test_load_without_config_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = Cli::parse_from(["sitegate", "--root", root, "build"]);
        let config = SiteConfig::load(&cli).unwrap();

        assert_eq!(config.site.name, "My Site");
        assert!(config.build.pages.ends_with("app"));
    }

    #[test]
    fn test_serve_overrides() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap();
        let cli = Cli::parse_from(["sitegate", "--root", root, "serve", "--port", "9000"]);
        let config = SiteConfig::load(&cli).unwrap();

        assert_eq!(config.serve.port, 9000);
        assert_eq!(config.serve.interface, "127.0.0.1");
    }
}

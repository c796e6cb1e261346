//! Artifact compilation.
//!
//! Turns resolved descriptors and content collections into the files the
//! deployed site serves:
//!
//! - **manifest**: `site-manifest.json`, the portable page list
//! - **sitemap**: `sitemap.xml` index plus `sitemap-<name>.xml` sub-documents
//! - **robots**: `robots.txt`
//! - **verify**: re-reads written artifacts and checks their invariants
//!
//! # Flow
//!
//! ```text
//! ResolvedSeoDescriptor[] ──┐
//! ContentCollection[] ──────┼──► compile() ──► Artifacts ──► write()
//! SiteConfig ───────────────┘
//! ```
//!
//! `compile` is pure; only `Artifacts::write` touches the filesystem.

pub mod content;
pub mod manifest;
pub mod robots;
pub mod sitemap;
pub mod verify;

pub use content::{ContentCollection, load_collections};
pub use manifest::SiteManifest;
pub use sitemap::SitemapSet;

use crate::{config::SiteConfig, log, seo::ResolvedSeoDescriptor, utils::fs::write_atomic};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Name of the robots document in the output directory.
pub const ROBOTS_FILE: &str = "robots.txt";

/// Every compiled artifact, held in memory until written.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub manifest: SiteManifest,
    pub sitemaps: SitemapSet,
    pub robots: String,
}

/// Compile all artifacts. Deterministic for unchanged inputs.
pub fn compile(
    descriptors: &[ResolvedSeoDescriptor],
    collections: &[ContentCollection],
    config: &SiteConfig,
) -> Artifacts {
    Artifacts {
        manifest: SiteManifest::build(descriptors, collections, config),
        sitemaps: sitemap::build_sitemaps(descriptors, collections, config),
        robots: robots::build_robots(config),
    }
}

impl Artifacts {
    /// Write every artifact into the configured output directory.
    ///
    /// Returns the written paths in write order.
    pub fn write(&self, config: &SiteConfig) -> Result<Vec<PathBuf>> {
        let mut written = write_manifest(&self.manifest, config)?;
        written.extend(write_sitemaps(&self.sitemaps, config)?);
        written.extend(write_robots(&self.robots, config)?);
        Ok(written)
    }
}

pub fn write_manifest(manifest: &SiteManifest, config: &SiteConfig) -> Result<Vec<PathBuf>> {
    let path = config.manifest_path();
    write_atomic(&path, manifest.to_json()?.as_bytes())?;
    log!("manifest"; "{} pages -> {}", manifest.pages.len(), display_name(&path));
    Ok(vec![path])
}

pub fn write_sitemaps(sitemaps: &SitemapSet, config: &SiteConfig) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (name, xml) in sitemaps.files() {
        let path = config.build.output.join(&name);
        write_atomic(&path, xml.as_bytes())?;
        written.push(path);
    }
    let urls: usize = sitemaps.documents.iter().map(|d| d.urls.len()).sum();
    log!("sitemap"; "{} documents, {} urls", written.len(), urls);
    Ok(written)
}

pub fn write_robots(robots: &str, config: &SiteConfig) -> Result<Vec<PathBuf>> {
    let path = config.build.output.join(ROBOTS_FILE);
    write_atomic(&path, robots.as_bytes())?;
    log!("robots"; "{}", display_name(&path));
    Ok(vec![path])
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        discovery::{RenderMode, RouteKind, RouteNode},
        seo::resolve,
    };
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.site.url = "https://acme.dev".into();
        config.build.output = dir.join("public");
        config
    }

    fn home(config: &SiteConfig) -> ResolvedSeoDescriptor {
        let route = RouteNode {
            route_path: "/".into(),
            kind: RouteKind::Static,
            render_mode: RenderMode::Server,
            source: "app/page.tsx".into(),
        };
        resolve(&route, None, config).unwrap()
    }

    #[test]
    fn test_write_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());

        let artifacts = compile(&[home(&config)], &[], &config);
        let written = artifacts.write(&config).unwrap();

        let out = &config.build.output;
        for name in [
            "site-manifest.json",
            "sitemap.xml",
            "sitemap-pages.xml",
            "sitemap-posts.xml",
            "sitemap-categories.xml",
            "robots.txt",
        ] {
            assert!(out.join(name).exists(), "{name} missing");
        }
        assert_eq!(written.len(), 6);
        // no temp files left behind
        assert!(fs::read_dir(out).unwrap().all(|e| {
            !e.unwrap().file_name().to_string_lossy().ends_with(".tmp")
        }));
    }

    #[test]
    fn test_rewrite_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let descs = vec![home(&config)];

        compile(&descs, &[], &config).write(&config).unwrap();
        let first = fs::read(config.build.output.join("sitemap.xml")).unwrap();
        let robots_first = fs::read(config.build.output.join("robots.txt")).unwrap();

        compile(&descs, &[], &config).write(&config).unwrap();
        assert_eq!(fs::read(config.build.output.join("sitemap.xml")).unwrap(), first);
        assert_eq!(
            fs::read(config.build.output.join("robots.txt")).unwrap(),
            robots_first
        );
    }

    #[test]
    fn test_robots_overwrites_prior_file() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(&config.build.output).unwrap();
        fs::write(config.build.output.join("robots.txt"), "User-agent: *\nDisallow: /\n").unwrap();

        write_robots(&robots::build_robots(&config), &config).unwrap();

        let robots = fs::read_to_string(config.build.output.join("robots.txt")).unwrap();
        assert!(robots.contains("Allow: /\n"));
        assert!(!robots.contains("Disallow: /\n"));
    }
}

//! Portable page manifest.
//!
//! A compiled snapshot of every static, non-administrative route with its
//! display metadata, readable without access to the page tree:
//!
//! ```json
//! {
//!   "site": "Acme",
//!   "pages": [
//!     { "slug": "home", "title": "Home", "path": "/", "category": null,
//!       "featured": false, "draft": false, "isHomePage": true, "renderMode": "server" }
//!   ],
//!   "collectionPaths": ["/blog/launch"]
//! }
//! ```
//!
//! The home page is always entry 0; the rest are sorted by title, then path.

use super::content::ContentCollection;
use crate::{
    config::SiteConfig,
    discovery::{RenderMode, RouteKind},
    gate::is_admin_path,
    seo::ResolvedSeoDescriptor,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fs, path::Path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub slug: String,
    pub title: String,
    pub path: String,
    pub category: Option<String>,
    pub featured: bool,
    pub draft: bool,
    pub is_home_page: bool,
    pub render_mode: RenderMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteManifest {
    #[serde(default)]
    pub site: String,
    pub pages: Vec<ManifestEntry>,
    /// Paths of every content-collection entry, sorted and de-duplicated.
    #[serde(default)]
    pub collection_paths: Vec<String>,
}

impl SiteManifest {
    /// Build the manifest from resolved descriptors and content collections.
    pub fn build(
        descriptors: &[ResolvedSeoDescriptor],
        collections: &[ContentCollection],
        config: &SiteConfig,
    ) -> Self {
        let mut pages: Vec<ManifestEntry> = descriptors
            .iter()
            .filter(|desc| {
                desc.kind != RouteKind::Dynamic && !is_admin_path(&desc.route_path, &config.gate)
            })
            .map(|desc| ManifestEntry {
                slug: desc.slug().to_owned(),
                title: desc.admin_title.clone(),
                path: desc.route_path.clone(),
                category: desc.category.clone(),
                featured: desc.featured,
                draft: desc.draft,
                is_home_page: desc.is_home(),
                render_mode: desc.render_mode,
            })
            .collect();

        pages.sort_by(|a, b| {
            b.is_home_page
                .cmp(&a.is_home_page)
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.path.cmp(&b.path))
        });

        let collection_paths: BTreeSet<String> = collections
            .iter()
            .flat_map(|c| c.entries.iter().map(|e| e.path()))
            .collect();

        Self {
            site: config.site.name.clone(),
            pages,
            collection_paths: collection_paths.into_iter().collect(),
        }
    }

    /// Serialize as pretty JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Malformed site manifest")
    }

    /// Read a manifest written by a previous build.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::from_json(&text)
    }
}

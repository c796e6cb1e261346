//! Sidecar override records.
//!
//! A route may carry a `seo.json` next to its page file. The admin CRUD
//! screens write these; the resolver only reads them.
//!
//! ```json
//! {
//!   "title": "Pricing",
//!   "seo": {
//!     "title": "Plans & Pricing",
//!     "robots": { "index": true, "follow": true },
//!     "sitemap": { "priority": 0.8, "changeFrequency": "weekly" }
//!   },
//!   "category": "product",
//!   "featured": true,
//!   "draft": false,
//!   "lastModified": "2025-01-31"
//! }
//! ```

use super::{ChangeFrequency, SeoError};
use crate::{discovery::RouteNode, log};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, io::ErrorKind};

/// Sidecar file name, colocated with the page-definition file.
pub const SIDECAR_FILE: &str = "seo.json";

/// Per-route override record. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SidecarOverride {
    /// Admin display title.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub seo: Option<SeoOverride>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub draft: Option<bool>,
    /// `YYYY-MM-DD` or RFC 3339.
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// `seo` block of a sidecar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeoOverride {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub canonical: Option<String>,
    #[serde(default)]
    pub robots: Option<RobotsOverride>,
    #[serde(default)]
    pub sitemap: Option<SitemapOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RobotsOverride {
    #[serde(default)]
    pub index: Option<bool>,
    #[serde(default)]
    pub follow: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SitemapOverride {
    #[serde(default)]
    pub priority: Option<f32>,
    #[serde(default)]
    pub change_frequency: Option<ChangeFrequency>,
    #[serde(default)]
    pub excluded: Option<bool>,
}

impl SidecarOverride {
    /// Parse a sidecar record from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SeoError> {
        serde_json::from_str(text).map_err(|err| SeoError::Malformed(err.to_string()))
    }
}

// ============================================================================
// Store
// ============================================================================

/// Sidecar records keyed by route path.
///
/// A missing record is the common case and not an error. Records that fail
/// to read or parse are reported in [`SidecarStore::issues`] and the route
/// behaves as if it had none.
#[derive(Debug, Clone, Default)]
pub struct SidecarStore {
    records: BTreeMap<String, SidecarOverride>,
    issues: Vec<(String, SeoError)>,
}

impl SidecarStore {
    /// Read the sidecar of every route from the page tree.
    pub fn load(routes: &[RouteNode]) -> Self {
        let mut store = Self::default();

        for route in routes {
            let path = route.directory().join(SIDECAR_FILE);
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => {
                    store.report(&route.route_path, SeoError::Malformed(err.to_string()));
                    continue;
                }
            };

            match SidecarOverride::from_json(&text) {
                Ok(record) => store.insert(route.route_path.clone(), record),
                Err(err) => store.report(&route.route_path, err),
            }
        }

        store
    }

    pub fn insert(&mut self, route_path: impl Into<String>, record: SidecarOverride) {
        self.records.insert(route_path.into(), record);
    }

    pub fn get(&self, route_path: &str) -> Option<&SidecarOverride> {
        self.records.get(route_path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Records that could not be used, with the route they belong to.
    pub fn issues(&self) -> &[(String, SeoError)] {
        &self.issues
    }

    fn report(&mut self, route_path: &str, err: SeoError) {
        log!("seo"; "{route_path}: {err}, using defaults");
        self.issues.push((route_path.to_owned(), err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{RenderMode, RouteKind};
    use std::path::Path;
    use tempfile::TempDir;

    fn route(root: &Path, rel: &str, path: &str) -> RouteNode {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        let source = dir.join("page.tsx");
        fs::write(&source, "export default 1;").unwrap();
        RouteNode {
            route_path: path.into(),
            kind: RouteKind::Static,
            render_mode: RenderMode::Server,
            source,
        }
    }

    #[test]
    fn test_parse_full_sidecar() {
        let record = SidecarOverride::from_json(
            r#"{
                "title": "Pricing",
                "seo": {
                    "title": "Plans",
                    "keywords": ["plans"],
                    "robots": { "index": false },
                    "sitemap": { "priority": 0.8, "changeFrequency": "weekly" }
                },
                "category": "product",
                "featured": true,
                "draft": false,
                "lastModified": "2025-01-31"
            }"#,
        )
        .unwrap();

        assert_eq!(record.title.as_deref(), Some("Pricing"));
        let seo = record.seo.unwrap();
        assert_eq!(seo.robots.unwrap().index, Some(false));
        let sitemap = seo.sitemap.unwrap();
        assert_eq!(sitemap.priority, Some(0.8));
        assert_eq!(sitemap.change_frequency, Some(ChangeFrequency::Weekly));
        assert_eq!(record.last_modified.as_deref(), Some("2025-01-31"));
    }

    #[test]
    fn test_parse_empty_sidecar() {
        assert_eq!(
            SidecarOverride::from_json("{}").unwrap(),
            SidecarOverride::default()
        );
    }

    #[test]
    fn test_unknown_field_is_malformed() {
        let err = SidecarOverride::from_json(r#"{ "titel": "typo" }"#).unwrap_err();
        assert!(matches!(err, SeoError::Malformed(_)));
    }

    #[test]
    fn test_store_load() {
        let dir = TempDir::new().unwrap();
        let home = route(dir.path(), "", "/");
        let pricing = route(dir.path(), "pricing", "/pricing");
        let broken = route(dir.path(), "broken", "/broken");
        fs::write(
            dir.path().join("pricing").join(SIDECAR_FILE),
            r#"{ "draft": true, "featured": false }"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken").join(SIDECAR_FILE), "{ not json").unwrap();

        let store = SidecarStore::load(&[home, pricing, broken]);

        assert_eq!(store.len(), 1);
        assert!(store.get("/").is_none());
        assert_eq!(store.get("/pricing").unwrap().draft, Some(true));
        assert!(store.get("/broken").is_none());
        assert_eq!(store.issues().len(), 1);
        assert_eq!(store.issues()[0].0, "/broken");
    }
}

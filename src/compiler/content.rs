//! Externally supplied content collections.
//!
//! Each configured collection (`posts`, `categories`, ...) is read from
//! `<content>/<name>.json`, an array of already-resolved sitemap entries:
//!
//! ```json
//! [
//!   { "url": "/blog/launch", "lastModified": "2025-01-31",
//!     "priority": 0.7, "changeFrequency": "weekly" }
//! ]
//! ```
//!
//! A missing file is an empty collection. Entries are taken as-is; the
//! compiler never re-derives them.

use crate::{seo::ChangeFrequency, utils::date::parse_lastmod};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::{fs, io::ErrorKind, path::Path};

/// One entry of a content collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCollectionEntry {
    /// Absolute URL or site-relative path.
    pub url: String,
    #[serde(default, deserialize_with = "deserialize_lastmod")]
    pub last_modified: Option<NaiveDate>,
    pub priority: f32,
    pub change_frequency: ChangeFrequency,
}

impl ContentCollectionEntry {
    /// URL path component, without scheme, host, query or trailing slash.
    pub fn path(&self) -> String {
        let url = self.url.as_str();
        let without_scheme = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"));
        let path = match without_scheme {
            Some(rest) => rest.find('/').map_or("/", |i| &rest[i..]),
            None => url,
        };
        crate::gate::normalize_path(path)
    }
}

/// A named sequence of entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentCollection {
    pub name: String,
    pub entries: Vec<ContentCollectionEntry>,
}

impl ContentCollection {
    pub fn new(name: impl Into<String>, entries: Vec<ContentCollectionEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// Read `<dir>/<name>.json`; a missing file yields an empty collection.
    pub fn load(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(format!("{name}.json"));
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(Self::new(name, Vec::new()));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        let entries = serde_json::from_str(&text)
            .with_context(|| format!("Malformed content collection {}", path.display()))?;
        Ok(Self::new(name, entries))
    }
}

/// Load every named collection, in the given order.
pub fn load_collections(dir: &Path, names: &[String]) -> Result<Vec<ContentCollection>> {
    names
        .iter()
        .map(|name| ContentCollection::load(dir, name))
        .collect()
}

fn deserialize_lastmod<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| {
        parse_lastmod(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid lastModified `{s}`")))
    })
    .transpose()
}

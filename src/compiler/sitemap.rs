//! Sitemap index and sub-document generation.
//!
//! One `sitemap-pages.xml` for static routes, one `sitemap-<name>.xml` per
//! configured content collection, and a `sitemap.xml` index over all of them:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <sitemap>
//!     <loc>https://example.com/sitemap-pages.xml</loc>
//!     <lastmod>2025-01-01</lastmod>
//!   </sitemap>
//! </sitemapindex>
//! ```
//!
//! An index entry's `<lastmod>` is the newest date in its own document,
//! else the newest date across all documents, else `[sitemap]
//! default_lastmod`. With none of those the element is omitted.
//!
//! Output never depends on wall-clock time, so unchanged inputs produce
//! byte-identical documents.

use super::content::ContentCollection;
use crate::{
    config::SiteConfig,
    discovery::RouteKind,
    gate::is_admin_path,
    seo::{ChangeFrequency, ResolvedSeoDescriptor},
    utils::date::{format_lastmod, parse_lastmod},
};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use quick_xml::{Reader, escape::unescape, events::Event};

// ============================================================================
// Constants
// ============================================================================

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// File name of the sitemap index.
pub const INDEX_FILE: &str = "sitemap.xml";

/// Name of the sub-document holding static routes.
pub const PAGES_SITEMAP: &str = "pages";

// ============================================================================
// Data Model
// ============================================================================

/// Single URL entry in a sub-document.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlEntry {
    /// Absolute URL location
    pub loc: String,
    pub lastmod: Option<NaiveDate>,
    pub change_frequency: Option<ChangeFrequency>,
    pub priority: Option<f32>,
}

/// A `<urlset>` document.
#[derive(Debug, Clone, PartialEq)]
pub struct SubSitemap {
    pub name: String,
    pub urls: Vec<UrlEntry>,
}

/// A `<sitemap>` reference inside the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub loc: String,
    pub lastmod: Option<NaiveDate>,
}

/// The index plus every sub-document it references, in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapSet {
    pub index: Vec<IndexEntry>,
    pub documents: Vec<SubSitemap>,
}

impl SubSitemap {
    pub fn file_name(&self) -> String {
        sub_sitemap_file(&self.name)
    }

    /// Newest `lastmod` among the entries.
    pub fn newest_lastmod(&self) -> Option<NaiveDate> {
        self.urls.iter().filter_map(|u| u.lastmod).max()
    }

    /// Render as a `<urlset>` document.
    ///
    /// Empty documents still render, carrying a comment so the file is never
    /// mistaken for a truncated write.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.urls.len() * 160);

        xml.push_str(XML_DECL);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        if self.urls.is_empty() {
            xml.push_str(&format!("  <!-- No {} published yet -->\n", self.name));
        }

        for entry in &self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            if let Some(lastmod) = entry.lastmod {
                xml.push_str(&format!("    <lastmod>{}</lastmod>\n", format_lastmod(lastmod)));
            }
            if let Some(freq) = entry.change_frequency {
                xml.push_str(&format!("    <changefreq>{freq}</changefreq>\n"));
            }
            if let Some(priority) = entry.priority {
                xml.push_str(&format!(
                    "    <priority>{}</priority>\n",
                    format_priority(priority)
                ));
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

impl SitemapSet {
    /// Render the `<sitemapindex>` document.
    pub fn index_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.index.len() * 128);

        xml.push_str(XML_DECL);
        xml.push('\n');
        xml.push_str(&format!(r#"<sitemapindex xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in &self.index {
            xml.push_str("  <sitemap>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            if let Some(lastmod) = entry.lastmod {
                xml.push_str(&format!("    <lastmod>{}</lastmod>\n", format_lastmod(lastmod)));
            }
            xml.push_str("  </sitemap>\n");
        }

        xml.push_str("</sitemapindex>\n");
        xml
    }

    /// Every `(file name, contents)` pair, index first.
    pub fn files(&self) -> Vec<(String, String)> {
        std::iter::once((INDEX_FILE.to_owned(), self.index_xml()))
            .chain(self.documents.iter().map(|doc| (doc.file_name(), doc.to_xml())))
            .collect()
    }
}

pub fn sub_sitemap_file(name: &str) -> String {
    format!("sitemap-{name}.xml")
}

// ============================================================================
// Public API
// ============================================================================

/// Build the pages sub-document, one sub-document per configured
/// collection, and the index over them.
///
/// Collections named in `[sitemap] collections` but absent from
/// `collections` still get an (empty) sub-document.
pub fn build_sitemaps(
    descriptors: &[ResolvedSeoDescriptor],
    collections: &[ContentCollection],
    config: &SiteConfig,
) -> SitemapSet {
    let mut documents = vec![pages_sitemap(descriptors, config)];

    for name in &config.sitemap.collections {
        let urls = collections
            .iter()
            .filter(|c| &c.name == name)
            .flat_map(|c| c.entries.iter())
            .map(|entry| UrlEntry {
                loc: config.site.absolute_url(&entry.url),
                lastmod: entry.last_modified,
                change_frequency: Some(entry.change_frequency),
                priority: Some(entry.priority),
            })
            .collect();
        documents.push(SubSitemap {
            name: name.clone(),
            urls,
        });
    }

    let newest_overall = documents
        .iter()
        .filter_map(SubSitemap::newest_lastmod)
        .max()
        .or_else(|| config.sitemap.default_lastmod.as_deref().and_then(parse_lastmod));
    let index = documents
        .iter()
        .map(|doc| IndexEntry {
            loc: config.site.absolute_url(&doc.file_name()),
            lastmod: doc.newest_lastmod().or(newest_overall),
        })
        .collect();

    SitemapSet { index, documents }
}

/// Static, indexable, non-administrative routes sorted by path.
fn pages_sitemap(descriptors: &[ResolvedSeoDescriptor], config: &SiteConfig) -> SubSitemap {
    let mut pages: Vec<&ResolvedSeoDescriptor> = descriptors
        .iter()
        .filter(|desc| {
            desc.kind == RouteKind::Static
                && !desc.sitemap.excluded
                && !is_admin_path(&desc.route_path, &config.gate)
        })
        .collect();
    pages.sort_by(|a, b| a.route_path.cmp(&b.route_path));

    let urls = pages
        .into_iter()
        .map(|desc| UrlEntry {
            loc: desc.canonical.clone(),
            lastmod: desc.last_modified,
            change_frequency: Some(desc.sitemap.change_frequency),
            priority: Some(desc.sitemap.priority),
        })
        .collect();

    SubSitemap {
        name: PAGES_SITEMAP.to_owned(),
        urls,
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Root element of a parsed sitemap document.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSitemap {
    Index(Vec<IndexEntry>),
    UrlSet(Vec<UrlEntry>),
}

/// Parse a sitemap index or `<urlset>` document.
///
/// Only `loc`, `lastmod`, `changefreq` and `priority` are read; unknown
/// elements are skipped. A document with neither root element is an error.
pub fn parse_sitemap(xml: &str) -> Result<ParsedSitemap> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<String> = None;
    let mut index = Vec::new();
    let mut urls = Vec::new();
    let mut current: Option<UrlEntry> = None;
    let mut element: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                match name.as_str() {
                    "sitemapindex" | "urlset" if root.is_none() => root = Some(name),
                    "sitemap" | "url" => {
                        current = Some(UrlEntry {
                            loc: String::new(),
                            lastmod: None,
                            change_frequency: None,
                            priority: None,
                        });
                    }
                    "loc" | "lastmod" | "changefreq" | "priority" if current.is_some() => {
                        element = Some(name);
                        text.clear();
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) if element.is_some() => {
                text.push_str(&String::from_utf8_lossy(&e));
            }
            Ok(Event::GeneralRef(e)) if element.is_some() => {
                text.push('&');
                text.push_str(&String::from_utf8_lossy(&e));
                text.push(';');
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if let (Some(field), Some(entry)) = (element.take(), current.as_mut()) {
                    let value = unescape(text.trim())?.into_owned();
                    match field.as_str() {
                        "loc" => entry.loc = value,
                        "lastmod" => entry.lastmod = parse_lastmod(&value),
                        "changefreq" => entry.change_frequency = value.parse().ok(),
                        "priority" => entry.priority = value.parse().ok(),
                        _ => {}
                    }
                    continue;
                }
                match name.as_str() {
                    "sitemap" => {
                        if let Some(entry) = current.take() {
                            index.push(IndexEntry {
                                loc: entry.loc,
                                lastmod: entry.lastmod,
                            });
                        }
                    }
                    "url" => urls.extend(current.take()),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!(
                "XML parse error at position {}: {e}",
                reader.error_position()
            ),
            _ => {}
        }
    }

    match root.as_deref() {
        Some("sitemapindex") => Ok(ParsedSitemap::Index(index)),
        Some("urlset") => Ok(ParsedSitemap::UrlSet(urls)),
        _ => bail!("Not a sitemap document"),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Two decimals at most, trailing zeros dropped, one decimal kept.
fn format_priority(priority: f32) -> String {
    let fixed = format!("{priority:.2}");
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_owned()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compiler::content::ContentCollectionEntry,
        discovery::{RenderMode, RouteNode},
        seo::{SidecarOverride, resolve},
    };
    use std::path::PathBuf;

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.site.url = "https://acme.dev".into();
        config
    }

    fn desc(path: &str, mode: RenderMode, sidecar: Option<&str>) -> ResolvedSeoDescriptor {
        let route = RouteNode {
            route_path: path.into(),
            kind: RouteKind::Static,
            render_mode: mode,
            source: PathBuf::from("page.tsx"),
        };
        let sidecar = sidecar.map(|json| SidecarOverride::from_json(json).unwrap());
        resolve(&route, sidecar.as_ref(), &config()).unwrap()
    }

    fn entry(url: &str, lastmod: Option<&str>) -> ContentCollectionEntry {
        ContentCollectionEntry {
            url: url.into(),
            last_modified: lastmod.map(|d| parse_lastmod(d).unwrap()),
            priority: 0.7,
            change_frequency: ChangeFrequency::Weekly,
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a&b"), "a&amp;b");
        assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
        assert_eq!(escape_xml("it's"), "it&apos;s");
    }

    #[test]
    fn test_format_priority() {
        assert_eq!(format_priority(0.5), "0.5");
        assert_eq!(format_priority(1.0), "1.0");
        assert_eq!(format_priority(0.75), "0.75");
        assert_eq!(format_priority(0.0), "0.0");
    }

    #[test]
    fn test_pricing_in_pages_sitemap() {
        let descs = vec![
            desc("/", RenderMode::Server, None),
            desc(
                "/pricing",
                RenderMode::Server,
                Some(r#"{"title": "Pricing", "draft": true, "featured": false}"#),
            ),
        ];

        let set = build_sitemaps(&descs, &[], &config());
        let pages = &set.documents[0];

        assert_eq!(pages.name, "pages");
        assert_eq!(pages.urls.len(), 2);
        let pricing = &pages.urls[1];
        assert_eq!(pricing.loc, "https://acme.dev/pricing");
        assert_eq!(pricing.priority, Some(0.5));
        assert_eq!(pricing.change_frequency, Some(ChangeFrequency::Monthly));

        let xml = pages.to_xml();
        assert!(xml.contains("<loc>https://acme.dev/pricing</loc>"));
        assert!(xml.contains("<priority>0.5</priority>"));
        assert!(xml.contains("<changefreq>monthly</changefreq>"));
    }

    #[test]
    fn test_excluded_and_client_routes_absent() {
        let descs = vec![
            desc("/", RenderMode::Server, None),
            desc("/dashboard", RenderMode::Client, None),
            desc(
                "/hidden",
                RenderMode::Server,
                Some(r#"{"seo": {"robots": {"index": false}}}"#),
            ),
            desc("/admin/settings", RenderMode::Server, None),
        ];

        let set = build_sitemaps(&descs, &[], &config());

        for (_, xml) in set.files() {
            assert!(!xml.contains("/dashboard"));
            assert!(!xml.contains("/hidden"));
            assert!(!xml.contains("/admin"));
        }
    }

    #[test]
    fn test_empty_collections_still_emitted() {
        let set = build_sitemaps(&[], &[], &config());
        let names: Vec<_> = set.files().into_iter().map(|(name, _)| name).collect();

        assert_eq!(
            names,
            vec![
                "sitemap.xml",
                "sitemap-pages.xml",
                "sitemap-posts.xml",
                "sitemap-categories.xml"
            ]
        );

        let posts = set.documents[1].to_xml();
        assert!(posts.contains("<!-- No posts published yet -->"));
        assert!(!posts.contains("<url>"));
        assert!(set.documents[2].to_xml().contains("No categories published yet"));
    }

    #[test]
    fn test_collection_urls_joined_to_site() {
        let collections = vec![ContentCollection::new(
            "posts",
            vec![
                entry("/blog/launch", Some("2025-03-01")),
                entry("https://cdn.acme.dev/blog/x", None),
            ],
        )];

        let set = build_sitemaps(&[], &collections, &config());
        let posts = &set.documents[1];

        assert_eq!(posts.urls[0].loc, "https://acme.dev/blog/launch");
        assert_eq!(posts.urls[1].loc, "https://cdn.acme.dev/blog/x");
        assert!(posts.to_xml().contains("<priority>0.7</priority>"));
    }

    #[test]
    fn test_index_lastmod_rules() {
        let collections = vec![ContentCollection::new(
            "posts",
            vec![
                entry("/blog/a", Some("2025-01-10")),
                entry("/blog/b", Some("2025-02-20")),
            ],
        )];

        let set = build_sitemaps(&[], &collections, &config());
        let date = |s: &str| Some(parse_lastmod(s).unwrap());

        // pages and categories have no dates of their own
        assert_eq!(set.index[0].lastmod, date("2025-02-20"));
        assert_eq!(set.index[1].lastmod, date("2025-02-20"));
        assert_eq!(set.index[1].loc, "https://acme.dev/sitemap-posts.xml");
        assert_eq!(set.index[2].lastmod, date("2025-02-20"));
    }

    #[test]
    fn test_index_lastmod_omitted_without_dates() {
        let set = build_sitemaps(&[], &[], &config());
        assert!(set.index.iter().all(|e| e.lastmod.is_none()));
        assert!(!set.index_xml().contains("<lastmod>"));
    }

    #[test]
    fn test_index_lastmod_falls_back_to_configured_date() {
        let mut config = config();
        config.sitemap.default_lastmod = Some("2025-01-01".into());

        let set = build_sitemaps(&[], &[], &config);
        let expected = parse_lastmod("2025-01-01");
        assert!(set.index.iter().all(|e| e.lastmod == expected));
        assert_eq!(set.index_xml().matches("<lastmod>2025-01-01</lastmod>").count(), 3);

        // real dates still win over the configured one
        let collections = vec![ContentCollection::new(
            "posts",
            vec![entry("/blog/a", Some("2025-02-20"))],
        )];
        let set = build_sitemaps(&[], &collections, &config);
        assert!(set.index.iter().all(|e| e.lastmod == parse_lastmod("2025-02-20")));
    }

    #[test]
    fn test_build_is_idempotent() {
        let descs = vec![
            desc("/", RenderMode::Server, None),
            desc("/pricing", RenderMode::Server, None),
        ];
        let collections = vec![ContentCollection::new(
            "posts",
            vec![entry("/blog/a", Some("2025-01-10"))],
        )];

        let a = build_sitemaps(&descs, &collections, &config()).files();
        let b = build_sitemaps(&descs, &collections, &config()).files();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_generated_documents() {
        let descs = vec![desc("/", RenderMode::Server, None)];
        let collections = vec![ContentCollection::new(
            "posts",
            vec![entry("/blog/a?x=1&y=2", Some("2025-01-10"))],
        )];
        let set = build_sitemaps(&descs, &collections, &config());

        let ParsedSitemap::Index(index) = parse_sitemap(&set.index_xml()).unwrap() else {
            panic!("expected index");
        };
        assert_eq!(index, set.index);

        let ParsedSitemap::UrlSet(urls) = parse_sitemap(&set.documents[1].to_xml()).unwrap()
        else {
            panic!("expected urlset");
        };
        assert_eq!(urls[0].loc, "https://acme.dev/blog/a?x=1&y=2");
        assert_eq!(urls[0].priority, Some(0.7));
    }

    #[test]
    fn test_parse_rejects_non_sitemap() {
        assert!(parse_sitemap("<html><body/></html>").is_err());
        assert!(parse_sitemap("<urlset><url><loc>x</url>").is_err());
    }
}

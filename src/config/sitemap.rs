//! `[sitemap]` and `[robots]` section configuration.

use super::defaults;
use crate::seo::ChangeFrequency;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[sitemap]` section in sitegate.toml.
///
/// # Example
/// ```toml
/// [sitemap]
/// page_priority = 0.5
/// page_change_frequency = "monthly"
/// collections = ["posts", "categories"]
/// default_lastmod = "2025-01-01"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SitemapSection {
    /// Default priority of the home route.
    #[serde(default = "defaults::sitemap::home_priority")]
    #[educe(Default = defaults::sitemap::home_priority())]
    pub home_priority: f32,

    /// Default change frequency of the home route.
    #[serde(default = "defaults::sitemap::home_change_frequency")]
    #[educe(Default = defaults::sitemap::home_change_frequency())]
    pub home_change_frequency: ChangeFrequency,

    /// Default priority of every other static route.
    #[serde(default = "defaults::sitemap::page_priority")]
    #[educe(Default = defaults::sitemap::page_priority())]
    pub page_priority: f32,

    /// Default change frequency of every other static route.
    #[serde(default = "defaults::sitemap::page_change_frequency")]
    #[educe(Default = defaults::sitemap::page_change_frequency())]
    pub page_change_frequency: ChangeFrequency,

    /// Content collections, each producing `sitemap-<name>.xml`.
    #[serde(default = "defaults::sitemap::collections")]
    #[educe(Default = defaults::sitemap::collections())]
    pub collections: Vec<String>,

    /// Index `<lastmod>` used when no sub-document carries a date.
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    #[serde(default)]
    pub default_lastmod: Option<String>,
}

/// `[robots]` section in sitegate.toml.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RobotsSection {
    /// Path prefixes emitted as `Disallow:` lines.
    #[serde(default = "defaults::robots::disallow")]
    #[educe(Default = defaults::robots::disallow())]
    pub disallow: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use crate::seo::ChangeFrequency;

    #[test]
    fn test_sitemap_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.sitemap.home_priority, 1.0);
        assert_eq!(config.sitemap.home_change_frequency, ChangeFrequency::Weekly);
        assert_eq!(config.sitemap.page_priority, 0.5);
        assert_eq!(config.sitemap.page_change_frequency, ChangeFrequency::Monthly);
        assert_eq!(config.sitemap.collections, vec!["posts", "categories"]);
        assert_eq!(config.sitemap.default_lastmod, None);
        assert_eq!(config.robots.disallow, vec!["/admin", "/api/"]);
    }

    #[test]
    fn test_sitemap_custom() {
        let config = r#"
            [sitemap]
            page_priority = 0.3
            page_change_frequency = "yearly"
            collections = ["posts"]
            default_lastmod = "2025-01-01"

            [robots]
            disallow = ["/admin", "/api/", "/preview"]
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.sitemap.page_priority, 0.3);
        assert_eq!(config.sitemap.page_change_frequency, ChangeFrequency::Yearly);
        assert_eq!(config.sitemap.collections, vec!["posts"]);
        assert_eq!(config.sitemap.default_lastmod.as_deref(), Some("2025-01-01"));
        assert_eq!(config.robots.disallow.len(), 3);
    }

    #[test]
    fn test_invalid_change_frequency_rejected() {
        let config = r#"
            [sitemap]
            page_change_frequency = "fortnightly"
        "#;
        assert!(toml::from_str::<SiteConfig>(config).is_err());
    }
}

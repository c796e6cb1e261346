//! `[site]` section configuration.
//!
//! The global SEO defaults every route falls back to.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Placeholder replaced by the admin title in `title_template`.
pub const TITLE_PLACEHOLDER: &str = "%s";

/// `[site]` section in sitegate.toml - global SEO defaults.
///
/// # Example
/// ```toml
/// [site]
/// name = "Acme"
/// url = "https://acme.dev"
/// title_template = "%s | Acme"
/// description = "Tools for builders"
/// keywords = ["acme", "tools"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Site name, used in titles and the manifest.
    #[serde(default = "defaults::site::name")]
    #[educe(Default = defaults::site::name())]
    pub name: String,

    /// Absolute base URL for canonical links, sitemaps and robots.
    #[serde(default = "defaults::site::url")]
    #[educe(Default = defaults::site::url())]
    pub url: String,

    /// Title template; `%s` is replaced by the route's admin title.
    #[serde(default = "defaults::site::title_template")]
    #[educe(Default = defaults::site::title_template())]
    pub title_template: String,

    /// Default meta description.
    #[serde(default)]
    pub description: String,

    /// Default keywords.
    #[serde(default)]
    pub keywords: BTreeSet<String>,
}

impl SiteSection {
    /// Apply the title template to an admin title.
    pub fn apply_title_template(&self, admin_title: &str) -> String {
        self.title_template.replace(TITLE_PLACEHOLDER, admin_title)
    }

    /// Join a site-relative path onto the base URL.
    ///
    /// Absolute URLs are returned unchanged.
    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        let base = self.url.trim_end_matches('/');
        match path {
            "" | "/" => format!("{base}/"),
            p if p.starts_with('/') => format!("{base}{p}"),
            p => format!("{base}/{p}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_site_section_full() {
        let config = r#"
            [site]
            name = "Acme"
            url = "https://acme.dev"
            title_template = "%s · Acme"
            description = "Tools for builders"
            keywords = ["tools", "acme"]
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.site.name, "Acme");
        assert_eq!(config.site.url, "https://acme.dev");
        assert_eq!(config.site.description, "Tools for builders");
        assert_eq!(
            config.site.keywords.iter().collect::<Vec<_>>(),
            vec!["acme", "tools"]
        );
    }

    #[test]
    fn test_site_section_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.site.name, "My Site");
        assert_eq!(config.site.title_template, "%s | My Site");
        assert!(config.site.keywords.is_empty());
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [site]
            name = "Acme"
            unknown_field = "should_fail"
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }

    #[test]
    fn test_apply_title_template() {
        let site = SiteSection {
            title_template: "%s | Acme".into(),
            ..SiteSection::default()
        };
        assert_eq!(site.apply_title_template("Pricing"), "Pricing | Acme");
    }

    #[test]
    fn test_absolute_url() {
        let site = SiteSection {
            url: "https://acme.dev/".into(),
            ..SiteSection::default()
        };
        assert_eq!(site.absolute_url("/"), "https://acme.dev/");
        assert_eq!(site.absolute_url("/pricing"), "https://acme.dev/pricing");
        assert_eq!(site.absolute_url("blog/a"), "https://acme.dev/blog/a");
        assert_eq!(
            site.absolute_url("https://cdn.acme.dev/x"),
            "https://cdn.acme.dev/x"
        );
    }
}

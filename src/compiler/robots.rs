//! `robots.txt` generation.
//!
//! ```text
//! User-agent: *
//! Allow: /
//! Disallow: /admin
//! Disallow: /api/
//!
//! Sitemap: https://example.com/sitemap.xml
//! ```

use super::sitemap::INDEX_FILE;
use crate::config::SiteConfig;

/// Render the robots document from the current config.
pub fn build_robots(config: &SiteConfig) -> String {
    let mut out = String::from("User-agent: *\nAllow: /\n");
    for prefix in &config.robots.disallow {
        out.push_str(&format!("Disallow: {prefix}\n"));
    }
    out.push('\n');
    out.push_str(&format!(
        "Sitemap: {}\n",
        config.site.absolute_url(INDEX_FILE)
    ));
    out
}

/// Whether the document declares at least one `Sitemap:` line.
pub fn has_sitemap_reference(robots: &str) -> bool {
    robots.lines().any(|line| {
        line.split_once(':')
            .is_some_and(|(key, value)| key.trim().eq_ignore_ascii_case("sitemap") && !value.trim().is_empty())
    })
}

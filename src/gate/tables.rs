//! Fixed redirect tables.

/// Retired sitemap names mapped to their current document.
const LEGACY_SITEMAPS: &[(&str, &str)] = &[
    ("/sitemap_index.xml", "/sitemap.xml"),
    ("/sitemap-index.xml", "/sitemap.xml"),
    ("/sitemap.txt", "/sitemap.xml"),
    ("/post-sitemap.xml", "/sitemap-posts.xml"),
    ("/sitemap-blog.xml", "/sitemap-posts.xml"),
    ("/page-sitemap.xml", "/sitemap-pages.xml"),
    ("/category-sitemap.xml", "/sitemap-categories.xml"),
];

/// Common misspellings and alternate names of real pages.
const TYPO_EXACT: &[(&str, &str)] = &[
    ("/tos", "/terms-of-service"),
    ("/terms", "/terms-of-service"),
    ("/privacy-policy", "/privacy"),
    ("/contact-us", "/contact"),
    ("/about-us", "/about"),
    ("/price", "/pricing"),
    ("/prices", "/pricing"),
    ("/home", "/"),
];

/// Length in bytes of the key used for prefix matching.
pub const TYPO_PREFIX_LEN: usize = 6;

/// Truncated paths matched on their first [`TYPO_PREFIX_LEN`] bytes.
const TYPO_PREFIX: &[(&str, &str)] = &[
    ("/priva", "/privacy"),
    ("/prici", "/pricing"),
    ("/terms", "/terms-of-service"),
    ("/conta", "/contact"),
];

/// Current sitemap document for a retired name.
pub fn legacy_sitemap(path: &str) -> Option<&'static str> {
    lookup(LEGACY_SITEMAPS, path)
}

/// Typo correction for `path`: exact table first, then prefix table.
///
/// Never returns `path` itself.
pub fn typo_target(path: &str) -> Option<&'static str> {
    let target = lookup(TYPO_EXACT, path).or_else(|| {
        let key = path.get(..TYPO_PREFIX_LEN)?;
        lookup(TYPO_PREFIX, key)
    })?;
    (target != path).then_some(target)
}

fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| *to)
}

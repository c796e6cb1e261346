//! `[build]` section configuration.
//!
//! Input and output locations for the compiler stages.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in sitegate.toml.
///
/// # Example
/// ```toml
/// [build]
/// pages = "app"            # Page-definition tree
/// content = "content"      # Content collection JSON files
/// output = "public"        # Generated artifacts
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Page-definition tree walked by route discovery.
    #[serde(default = "defaults::build::pages")]
    #[educe(Default = defaults::build::pages())]
    pub pages: PathBuf,

    /// Directory holding `<collection>.json` files.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Output directory for sitemaps, robots.txt and the manifest.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Manifest file name, relative to `output`.
    #[serde(default = "defaults::build::manifest")]
    #[educe(Default = defaults::build::manifest())]
    pub manifest: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.pages, PathBuf::from("app"));
        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.manifest, PathBuf::from("site-manifest.json"));
        assert!(config.build.root.is_none());
    }

    #[test]
    fn test_build_custom_paths() {
        let config = r#"
            [build]
            pages = "src/app"
            output = "dist"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.pages, PathBuf::from("src/app"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.build.content, PathBuf::from("content"));
    }
}

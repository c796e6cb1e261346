//! SEO configuration resolution.
//!
//! Merges the global `[site]`/`[sitemap]` defaults with an optional
//! per-route sidecar into one [`ResolvedSeoDescriptor`] per route.
//!
//! ```text
//! RouteNode ──┐
//! seo.json ───┼──► resolve() ──► ResolvedSeoDescriptor
//! SiteConfig ─┘
//! ```
//!
//! Sidecar fields win over derived defaults; the global config only supplies
//! templates and defaults. Two rules always hold on the result:
//!
//! - `robots.index == false` implies `sitemap.excluded`
//! - client-rendered routes are excluded and ignore `seo.*` sidecar fields

mod error;
mod resolve;
mod sidecar;

pub use error::SeoError;
pub use resolve::{resolve, resolve_all};
pub use sidecar::{SidecarOverride, SidecarStore};

use crate::discovery::{RenderMode, RouteKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};

// ============================================================================
// Change Frequency
// ============================================================================

/// Sitemap `<changefreq>` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeFrequency {
    type Err = SeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            _ => Err(SeoError::InvalidChangeFrequency(s.to_owned())),
        }
    }
}

// ============================================================================
// Resolved Descriptor
// ============================================================================

/// `<meta name="robots">` directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsDirectives {
    pub index: bool,
    pub follow: bool,
}

impl Default for RobotsDirectives {
    fn default() -> Self {
        Self {
            index: true,
            follow: true,
        }
    }
}

impl fmt::Display for RobotsDirectives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = if self.index { "index" } else { "noindex" };
        let follow = if self.follow { "follow" } else { "nofollow" };
        write!(f, "{index}, {follow}")
    }
}

/// Sitemap placement of a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SitemapSettings {
    /// Always within `0.0..=1.0`.
    pub priority: f32,
    pub change_frequency: ChangeFrequency,
    pub excluded: bool,
}

/// Fully resolved SEO and display metadata for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSeoDescriptor {
    pub route_path: String,
    pub kind: RouteKind,
    pub render_mode: RenderMode,

    pub title: String,
    pub description: String,
    pub keywords: BTreeSet<String>,
    pub canonical: String,
    pub robots: RobotsDirectives,
    pub sitemap: SitemapSettings,

    /// Display title used by admin screens and the manifest.
    pub admin_title: String,
    pub category: Option<String>,
    pub featured: bool,
    pub draft: bool,
    pub last_modified: Option<NaiveDate>,
}

impl ResolvedSeoDescriptor {
    pub fn is_home(&self) -> bool {
        self.route_path == "/"
    }

    /// Last URL segment, or `home` for the root route.
    pub fn slug(&self) -> &str {
        match self.route_path.rsplit('/').next() {
            Some("") | None => "home",
            Some(segment) => segment,
        }
    }
}

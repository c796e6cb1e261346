//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    pub fn name() -> String {
        "My Site".into()
    }

    pub fn url() -> String {
        "http://localhost:5277".into()
    }

    pub fn title_template() -> String {
        "%s | My Site".into()
    }
}

// ============================================================================
// [sitemap] Section Defaults
// ============================================================================

pub mod sitemap {
    use crate::seo::ChangeFrequency;

    pub fn home_priority() -> f32 {
        1.0
    }

    pub fn home_change_frequency() -> ChangeFrequency {
        ChangeFrequency::Weekly
    }

    pub fn page_priority() -> f32 {
        0.5
    }

    pub fn page_change_frequency() -> ChangeFrequency {
        ChangeFrequency::Monthly
    }

    pub fn collections() -> Vec<String> {
        vec!["posts".into(), "categories".into()]
    }
}

// ============================================================================
// [robots] Section Defaults
// ============================================================================

pub mod robots {
    pub fn disallow() -> Vec<String> {
        vec!["/admin".into(), "/api/".into()]
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn pages() -> PathBuf {
        "app".into()
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn manifest() -> PathBuf {
        "site-manifest.json".into()
    }
}

// ============================================================================
// [gate] Section Defaults
// ============================================================================

pub mod gate {
    pub fn admin_prefix() -> String {
        "/admin".into()
    }

    pub fn admin_api_prefix() -> String {
        "/api/admin".into()
    }

    pub fn login_page() -> String {
        "/admin/login".into()
    }

    pub fn login_endpoint() -> String {
        "/api/admin/login".into()
    }

    pub fn blog_prefix() -> String {
        "/blog".into()
    }

    pub fn asset_prefixes() -> Vec<String> {
        vec!["/_next/".into(), "/static/".into()]
    }

    pub mod auth {
        pub fn cookie() -> String {
            "admin_token".into()
        }

        pub fn token_hash() -> Option<String> {
            None
        }
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5277
    }
}

//! `[gate]` section configuration.
//!
//! Prefixes and credentials consulted by the edge route gate.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// Environment variable that disables admin auth regardless of config.
pub const DISABLE_AUTH_ENV: &str = "SITEGATE_DISABLE_AUTH";

/// `[gate]` section in sitegate.toml.
///
/// # Example
/// ```toml
/// [gate]
/// admin_prefix = "/admin"
/// asset_prefixes = ["/_next/", "/static/"]
///
/// [gate.auth]
/// enabled = true
/// token_hash = "9f86d081884c7d65..."
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct GateSection {
    /// Administrative UI prefix.
    #[serde(default = "defaults::gate::admin_prefix")]
    #[educe(Default = defaults::gate::admin_prefix())]
    pub admin_prefix: String,

    /// Administrative API prefix.
    #[serde(default = "defaults::gate::admin_api_prefix")]
    #[educe(Default = defaults::gate::admin_api_prefix())]
    pub admin_api_prefix: String,

    /// Login page, reachable without a credential.
    #[serde(default = "defaults::gate::login_page")]
    #[educe(Default = defaults::gate::login_page())]
    pub login_page: String,

    /// Login endpoint, reachable without a credential.
    #[serde(default = "defaults::gate::login_endpoint")]
    #[educe(Default = defaults::gate::login_endpoint())]
    pub login_endpoint: String,

    /// Blog prefix; unmatched paths below it go to the not-found handler.
    #[serde(default = "defaults::gate::blog_prefix")]
    #[educe(Default = defaults::gate::blog_prefix())]
    pub blog_prefix: String,

    /// Framework asset prefixes that bypass the gate.
    #[serde(default = "defaults::gate::asset_prefixes")]
    #[educe(Default = defaults::gate::asset_prefixes())]
    pub asset_prefixes: Vec<String>,

    /// Admin authentication.
    #[serde(default)]
    pub auth: AuthSection,
}

/// `[gate.auth]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    /// Operational escape hatch; `false` lets every admin request through.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enabled: bool,

    /// Cookie carrying the admin bearer token.
    #[serde(default = "defaults::gate::auth::cookie")]
    #[educe(Default = defaults::gate::auth::cookie())]
    pub cookie: String,

    /// BLAKE3 hex digest of the issued bearer token.
    #[serde(default = "defaults::gate::auth::token_hash")]
    #[educe(Default = defaults::gate::auth::token_hash())]
    pub token_hash: Option<String>,
}

impl AuthSection {
    /// Whether admin auth is in force, honouring [`DISABLE_AUTH_ENV`].
    pub fn is_enforced(&self) -> bool {
        self.enabled && !env_disables_auth(std::env::var(DISABLE_AUTH_ENV).ok().as_deref())
    }
}

fn env_disables_auth(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use super::*;

    #[test]
    fn test_gate_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.gate.admin_prefix, "/admin");
        assert_eq!(config.gate.admin_api_prefix, "/api/admin");
        assert_eq!(config.gate.login_page, "/admin/login");
        assert_eq!(config.gate.blog_prefix, "/blog");
        assert!(config.gate.auth.enabled);
        assert_eq!(config.gate.auth.cookie, "admin_token");
        assert!(config.gate.auth.token_hash.is_none());
    }

    #[test]
    fn test_gate_auth_disabled() {
        let config = r#"
            [gate.auth]
            enabled = false
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert!(!config.gate.auth.enabled);
        assert!(!config.gate.auth.is_enforced());
    }

    #[test]
    fn test_env_disables_auth() {
        assert!(env_disables_auth(Some("1")));
        assert!(env_disables_auth(Some("TRUE")));
        assert!(env_disables_auth(Some(" yes ")));
        assert!(!env_disables_auth(Some("0")));
        assert!(!env_disables_auth(Some("")));
        assert!(!env_disables_auth(None));
    }
}

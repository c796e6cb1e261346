//! Edge route gate.
//!
//! Decides, once per request, whether a path passes through, redirects, is
//! denied, or falls to the not-found handler. The decision is an ordered
//! rule chain where the first rule that returns a verdict wins:
//!
//! ```text
//! legacy-sitemap ─► passthrough ─► admin ─► manifest ─► blog ─► typo ─► fallback
//! ```
//!
//! Sitemap aliases run before the asset bypass because their dotted names
//! look like assets. Admin auth runs before manifest membership because
//! admin routes are never in the manifest.
//!
//! The only state is the set of known paths from the page manifest, held
//! behind an [`ArcSwap`] so the preview server can reload it without
//! blocking requests.

mod auth;
mod tables;

pub use auth::{BlakeTokenVerifier, TokenVerifier, clear_cookie, extract_credential};
pub use tables::{legacy_sitemap, typo_target};

use crate::{compiler::SiteManifest, config::GateSection, log};
use arc_swap::ArcSwap;
use std::{collections::HashSet, sync::Arc};

// ============================================================================
// Request and Verdict
// ============================================================================

/// The parts of a request the gate looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRequest {
    /// Normalized path, see [`normalize_path`].
    pub path: String,
    pub credential: Option<String>,
}

impl GateRequest {
    pub fn new(raw_path: &str, credential: Option<String>) -> Self {
        Self {
            path: normalize_path(raw_path),
            credential,
        }
    }
}

/// Terminal outcome for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Continue to the requested resource.
    Pass,
    Redirect { location: String, permanent: bool },
    Deny { status: u16, body: String },
    /// Continue to the not-found handler.
    NotFound,
}

impl Decision {
    fn redirect(location: impl Into<String>, permanent: bool) -> Self {
        Self::Redirect {
            location: location.into(),
            permanent,
        }
    }

    /// HTTP status the decision implies, if it ends the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Redirect { permanent: true, .. } => Some(301),
            Self::Redirect { permanent: false, .. } => Some(302),
            Self::Deny { status, .. } => Some(*status),
            Self::Pass | Self::NotFound => None,
        }
    }
}

/// A decision plus the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    pub rule: &'static str,
    /// The presented credential was rejected and should be removed.
    pub clear_credential: bool,
}

impl Verdict {
    fn new(decision: Decision) -> Self {
        Self {
            decision,
            rule: "",
            clear_credential: false,
        }
    }

    fn pass() -> Self {
        Self::new(Decision::Pass)
    }
}

/// Body of the 401 returned to unauthenticated admin API calls.
pub const UNAUTHORIZED_BODY: &str = r#"{"error":"Unauthorized"}"#;

// ============================================================================
// Rules
// ============================================================================

type Check = fn(&Gate, &GateRequest) -> Option<Verdict>;

/// One link of the chain.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    check: Check,
}

/// The rule chain in evaluation order.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule { name: "legacy-sitemap", check: legacy_sitemap_rule },
        Rule { name: "passthrough", check: passthrough_rule },
        Rule { name: "admin", check: admin_rule },
        Rule { name: "manifest", check: manifest_rule },
        Rule { name: "blog-deferral", check: blog_rule },
        Rule { name: "typo", check: typo_rule },
        Rule { name: "fallback", check: fallback_rule },
    ]
}

fn legacy_sitemap_rule(_: &Gate, req: &GateRequest) -> Option<Verdict> {
    legacy_sitemap(&req.path).map(|target| Verdict::new(Decision::redirect(target, true)))
}

fn passthrough_rule(gate: &Gate, req: &GateRequest) -> Option<Verdict> {
    let path = req.path.as_str();
    let section = &gate.section;

    let asset = section
        .asset_prefixes
        .iter()
        .any(|prefix| has_prefix_segment(path, prefix));
    let public_api =
        has_prefix_segment(path, "/api") && !has_prefix_segment(path, &section.admin_api_prefix);
    let file = !is_admin_path(path, section) && has_extension(path);

    (asset || public_api || file || path == "/favicon.ico").then(Verdict::pass)
}

fn admin_rule(gate: &Gate, req: &GateRequest) -> Option<Verdict> {
    let section = &gate.section;
    let api = has_prefix_segment(&req.path, &section.admin_api_prefix);
    if !api && !has_prefix_segment(&req.path, &section.admin_prefix) {
        return None;
    }

    if !gate.auth_enforced
        || req.path == normalize_path(&section.login_page)
        || req.path == normalize_path(&section.login_endpoint)
    {
        return Some(Verdict::pass());
    }

    let Some(token) = req.credential.as_deref() else {
        return Some(gate.unauthenticated(api, false));
    };

    match gate.verifier.verify(token) {
        Ok(true) => Some(Verdict::pass()),
        Ok(false) => Some(gate.unauthenticated(api, true)),
        Err(err) => {
            log!("gate"; "token verification failed for {}: {err:#}", req.path);
            Some(gate.unauthenticated(api, true))
        }
    }
}

fn manifest_rule(gate: &Gate, req: &GateRequest) -> Option<Verdict> {
    gate.known.load().contains(&req.path).then(Verdict::pass)
}

fn blog_rule(gate: &Gate, req: &GateRequest) -> Option<Verdict> {
    has_prefix_segment(&req.path, &gate.section.blog_prefix)
        .then(|| Verdict::new(Decision::NotFound))
}

fn typo_rule(_: &Gate, req: &GateRequest) -> Option<Verdict> {
    typo_target(&req.path).map(|target| Verdict::new(Decision::redirect(target, true)))
}

fn fallback_rule(_: &Gate, _: &GateRequest) -> Option<Verdict> {
    Some(Verdict::new(Decision::NotFound))
}

// ============================================================================
// Gate
// ============================================================================

/// Paths the manifest knows about.
type KnownPaths = HashSet<String>;

/// The request-time decision function.
pub struct Gate {
    section: GateSection,
    auth_enforced: bool,
    verifier: Box<dyn TokenVerifier>,
    known: ArcSwap<KnownPaths>,
    rules: Vec<Rule>,
}

impl Gate {
    /// Build a gate over a manifest snapshot.
    ///
    /// Whether auth is enforced is decided here, once, from config and
    /// environment.
    pub fn new(
        section: &GateSection,
        manifest: &SiteManifest,
        verifier: Box<dyn TokenVerifier>,
    ) -> Self {
        Self {
            section: section.clone(),
            auth_enforced: section.auth.is_enforced(),
            verifier,
            known: ArcSwap::from_pointee(known_paths(manifest)),
            rules: default_rules(),
        }
    }

    /// Replace the manifest snapshot.
    pub fn reload(&self, manifest: &SiteManifest) {
        self.known.store(Arc::new(known_paths(manifest)));
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name).collect()
    }

    /// Evaluate the chain; the first verdict wins.
    pub fn evaluate(&self, req: &GateRequest) -> Verdict {
        for rule in &self.rules {
            if let Some(mut verdict) = (rule.check)(self, req) {
                verdict.rule = rule.name;
                return verdict;
            }
        }
        // fallback always answers
        Verdict {
            rule: "fallback",
            ..Verdict::new(Decision::NotFound)
        }
    }

    fn unauthenticated(&self, api: bool, clear_credential: bool) -> Verdict {
        let decision = if api {
            Decision::Deny {
                status: 401,
                body: UNAUTHORIZED_BODY.to_owned(),
            }
        } else {
            Decision::redirect(normalize_path(&self.section.login_page), false)
        };
        Verdict {
            clear_credential,
            ..Verdict::new(decision)
        }
    }
}

fn known_paths(manifest: &SiteManifest) -> KnownPaths {
    manifest
        .pages
        .iter()
        .map(|page| normalize_path(&page.path))
        .chain(manifest.collection_paths.iter().map(|p| normalize_path(p)))
        .collect()
}

// ============================================================================
// Path Helpers
// ============================================================================

/// Strip query and fragment, collapse empty and `.` segments, and resolve
/// `..` against the preceding segment. `..` above the root stays at the root.
pub fn normalize_path(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw[..end].split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

/// `path` equals `prefix` or continues it with a `/`.
pub fn has_prefix_segment(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return false;
    }
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Whether a path is in the admin UI or admin API area.
pub fn is_admin_path(path: &str, section: &GateSection) -> bool {
    has_prefix_segment(path, &section.admin_prefix)
        || has_prefix_segment(path, &section.admin_api_prefix)
}

/// Whether the last segment looks like a file name (`name.ext`).
fn has_extension(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
}

// ============================================================================
// Tests
// ============================================================================

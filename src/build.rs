//! Stage orchestration.
//!
//! Each CLI stage loads only what it needs and writes only its own
//! artifact; `build` runs them all and then verifies the output.
//!
//! # Architecture
//!
//! ```text
//! discover_routes() ──► resolve_all() ──► compile() ──► Artifacts::write()
//!   page tree           seo.json            + content/*.json
//!                                                           │
//!                                                           ▼
//!                                                    verify_output()
//! ```

use crate::{
    compiler::{
        self, Artifacts, ContentCollection, SiteManifest, load_collections, robots,
        sitemap::build_sitemaps,
        verify::{VerifyReport, verify_output},
    },
    config::{DISABLE_AUTH_ENV, SiteConfig},
    discovery::{RouteNode, discover_routes},
    gate::{BlakeTokenVerifier, Decision, Gate, GateRequest, Verdict},
    log,
    seo::{ResolvedSeoDescriptor, SidecarStore, resolve_all},
};
use anyhow::{Context, Result, bail};
use std::io::ErrorKind;

// ============================================================================
// Shared Inputs
// ============================================================================

/// Discover every route under the configured page tree.
pub fn discover(config: &SiteConfig) -> Result<Vec<RouteNode>> {
    let routes = discover_routes(&config.build.pages)
        .with_context(|| format!("Route discovery failed in {}", config.build.pages.display()))?;
    log!("discover"; "{} routes", routes.len());
    Ok(routes)
}

/// Discover and resolve; invalid sidecars fall back to defaults.
pub fn resolve_site(config: &SiteConfig) -> Result<Vec<ResolvedSeoDescriptor>> {
    let routes = discover(config)?;
    let sidecars = SidecarStore::load(&routes);
    let descriptors = resolve_all(&routes, &sidecars, config);
    match sidecars.issues().len() {
        0 => log!("seo"; "{} sidecars", sidecars.len()),
        invalid => log!("seo"; "{} sidecars, {invalid} invalid", sidecars.len()),
    }
    Ok(descriptors)
}

fn collections(config: &SiteConfig) -> Result<Vec<ContentCollection>> {
    load_collections(&config.build.content, &config.sitemap.collections)
}

// ============================================================================
// Stages
// ============================================================================

/// `routes`: print the discovered route table.
pub fn print_routes(config: &SiteConfig) -> Result<()> {
    for route in discover(config)? {
        let kind = if route.is_dynamic() { "dynamic" } else { "static" };
        let source = route
            .source
            .strip_prefix(&config.build.pages)
            .unwrap_or(&route.source);
        println!(
            "{:<32} {:<8} {:<7} {}",
            route.route_path,
            kind,
            route.render_mode.name(),
            source.display()
        );
    }
    Ok(())
}

/// `manifest`: write the page manifest.
pub fn build_manifest(config: &SiteConfig) -> Result<()> {
    let descriptors = resolve_site(config)?;
    let manifest = SiteManifest::build(&descriptors, &collections(config)?, config);
    compiler::write_manifest(&manifest, config)?;
    Ok(())
}

/// `sitemap`: write the sitemap index and every sub-document.
pub fn build_sitemap(config: &SiteConfig) -> Result<()> {
    let descriptors = resolve_site(config)?;
    let sitemaps = build_sitemaps(&descriptors, &collections(config)?, config);
    compiler::write_sitemaps(&sitemaps, config)?;
    Ok(())
}

/// `robots`: write robots.txt.
pub fn build_robots(config: &SiteConfig) -> Result<()> {
    compiler::write_robots(&robots::build_robots(config), config)?;
    Ok(())
}

/// Compile every artifact in memory.
pub fn compile_site(config: &SiteConfig) -> Result<Artifacts> {
    let descriptors = resolve_site(config)?;
    Ok(compiler::compile(&descriptors, &collections(config)?, config))
}

/// `build`: compile, write and verify every artifact.
pub fn build_all(config: &SiteConfig) -> Result<Artifacts> {
    let artifacts = compile_site(config)?;
    artifacts.write(config)?;
    verify(config)?;
    log!("build"; "done -> {}", config.build.output.display());
    Ok(artifacts)
}

/// `verify`: re-read the written artifacts.
pub fn verify(config: &SiteConfig) -> Result<VerifyReport> {
    let report = verify_output(config);
    for problem in &report.problems {
        log!("verify"; "{problem}");
    }
    if !report.is_ok() {
        bail!("{} artifact checks failed", report.problems.len());
    }
    log!("verify"; "{} files ok", report.checked.len());
    Ok(report)
}

// ============================================================================
// Gate
// ============================================================================

/// Load the written manifest; a missing one yields an empty snapshot.
pub fn load_manifest(config: &SiteConfig) -> Result<SiteManifest> {
    let path = config.manifest_path();
    match SiteManifest::load(&path) {
        Ok(manifest) => Ok(manifest),
        Err(err)
            if err
                .downcast_ref::<std::io::Error>()
                .is_some_and(|io| io.kind() == ErrorKind::NotFound) =>
        {
            log!("warn"; "{} not found, run `build` first", path.display());
            Ok(SiteManifest::default())
        }
        Err(err) => Err(err),
    }
}

/// Build the gate from config and the written manifest.
pub fn open_gate(config: &SiteConfig) -> Result<Gate> {
    let verifier = BlakeTokenVerifier::new(config.gate.auth.token_hash.as_deref())?;
    let manifest = load_manifest(config)?;
    if !config.gate.auth.is_enforced() {
        log!("warn"; "admin auth disabled by [gate.auth] or {DISABLE_AUTH_ENV}");
    }
    Ok(Gate::new(&config.gate, &manifest, Box::new(verifier)))
}

/// `check`: print the gate decision for one path.
pub fn check_path(config: &SiteConfig, path: &str, token: Option<&str>) -> Result<Verdict> {
    let gate = open_gate(config)?;
    let request = GateRequest::new(path, token.map(str::to_owned));
    let verdict = gate.evaluate(&request);

    let outcome = match &verdict.decision {
        Decision::Pass => "pass".to_owned(),
        Decision::NotFound => "not found".to_owned(),
        Decision::Redirect { location, .. } => {
            format!("redirect {} -> {location}", verdict.decision.status().unwrap_or(302))
        }
        Decision::Deny { status, body } => format!("deny {status} {body}"),
    };
    let clear = if verdict.clear_credential { " (clear credential)" } else { "" };
    log!("gate"; "{} [{}] {outcome}{clear}", request.path, verdict.rule);
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    /// Lay out a small site: home, pricing (with sidecar), a client
    /// dashboard, a dynamic blog route and an admin page.
    fn site(dir: &Path) -> SiteConfig {
        let app = dir.join("app");
        for (route, source) in [
            ("", "export default function Home() { return <main/> }"),
            ("pricing", "export default function Pricing() { return <main/> }"),
            ("dashboard", "'use client'\nexport default function D() {}"),
            ("blog/[slug]", "export default function Post() {}"),
            ("admin/settings", "export default function Settings() {}"),
        ] {
            let route_dir = app.join(route);
            fs::create_dir_all(&route_dir).unwrap();
            fs::write(route_dir.join("page.tsx"), source).unwrap();
        }
        fs::write(
            app.join("pricing/seo.json"),
            r#"{"title": "Pricing", "draft": true, "featured": false}"#,
        )
        .unwrap();

        let mut config = SiteConfig::default();
        config.site.url = "https://acme.dev".into();
        config.build.pages = app;
        config.build.content = dir.join("content");
        config.build.output = dir.join("public");
        config
    }

    #[test]
    fn test_build_home_and_pricing() {
        let dir = TempDir::new().unwrap();
        let config = site(dir.path());

        let artifacts = build_all(&config).unwrap();

        let pages = &artifacts.manifest.pages;
        let paths: Vec<_> = pages.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["/", "/dashboard", "/pricing"]);
        assert!(pages[0].is_home_page);
        let pricing = pages.iter().find(|p| p.path == "/pricing").unwrap();
        assert!(pricing.draft);
        assert!(!pricing.featured);

        let pages_xml = fs::read_to_string(config.build.output.join("sitemap-pages.xml")).unwrap();
        assert!(pages_xml.contains("<loc>https://acme.dev/pricing</loc>"));
        assert!(!pages_xml.contains("/dashboard"));
        assert!(!pages_xml.contains("/admin"));
    }

    #[test]
    fn test_build_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = site(dir.path());
        let out = &config.build.output;
        let names = ["site-manifest.json", "sitemap.xml", "sitemap-pages.xml", "robots.txt"];

        build_all(&config).unwrap();
        let first: Vec<_> = names.iter().map(|n| fs::read(out.join(n)).unwrap()).collect();
        build_all(&config).unwrap();
        let second: Vec<_> = names.iter().map(|n| fs::read(out.join(n)).unwrap()).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_single_stage_writes_only_its_artifact() {
        let dir = TempDir::new().unwrap();
        let config = site(dir.path());

        build_robots(&config).unwrap();

        assert!(config.build.output.join("robots.txt").exists());
        assert!(!config.build.output.join("sitemap.xml").exists());
        assert!(verify(&config).is_err());
    }

    #[test]
    fn test_missing_page_tree_fails() {
        let dir = TempDir::new().unwrap();
        let mut config = site(dir.path());
        config.build.pages = dir.path().join("nope");

        assert!(build_all(&config).is_err());
        assert!(!config.build.output.join("site-manifest.json").exists());
    }

    #[test]
    fn test_malformed_collection_aborts() {
        let dir = TempDir::new().unwrap();
        let config = site(dir.path());
        fs::create_dir_all(&config.build.content).unwrap();
        fs::write(config.build.content.join("posts.json"), "{not json").unwrap();

        assert!(build_all(&config).is_err());
        assert!(!config.build.output.join("sitemap.xml").exists());
    }

    #[test]
    fn test_check_uses_written_manifest() {
        let dir = TempDir::new().unwrap();
        let config = site(dir.path());
        build_all(&config).unwrap();

        assert_eq!(check_path(&config, "/pricing/", None).unwrap().rule, "manifest");
        let admin = check_path(&config, "/admin/settings", None).unwrap();
        assert_eq!(admin.decision.status(), Some(302));
        assert_eq!(check_path(&config, "/tos", None).unwrap().rule, "typo");
    }

    #[test]
    fn test_check_without_manifest() {
        let dir = TempDir::new().unwrap();
        let config = site(dir.path());

        let verdict = check_path(&config, "/pricing", None).unwrap();

        assert_eq!(verdict.rule, "fallback");
    }
}

//! Post-build verification of written artifacts.
//!
//! Re-reads the output directory rather than trusting in-memory state, so it
//! also catches stale or hand-edited files from earlier builds.

use super::{
    ROBOTS_FILE, SiteManifest,
    robots::has_sitemap_reference,
    sitemap::{INDEX_FILE, ParsedSitemap, parse_sitemap},
};
use crate::config::SiteConfig;
use std::{fs, path::Path};

/// Outcome of a verification pass.
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Files that were read and passed.
    pub checked: Vec<String>,
    /// One message per failed check.
    pub problems: Vec<String>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    fn pass(&mut self, name: impl Into<String>) {
        self.checked.push(name.into());
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.problems.push(message.into());
    }
}

/// Check the manifest, every sitemap the index references, and robots.
pub fn verify_output(config: &SiteConfig) -> VerifyReport {
    let mut report = VerifyReport::default();
    let output = &config.build.output;

    verify_manifest(&config.manifest_path(), &mut report);
    verify_sitemaps(output, &mut report);
    verify_robots(&output.join(ROBOTS_FILE), &mut report);

    report
}

fn verify_manifest(path: &Path, report: &mut VerifyReport) {
    let manifest = match SiteManifest::load(path) {
        Ok(manifest) => manifest,
        Err(err) => return report.fail(format!("{err:#}")),
    };
    match manifest.pages.first() {
        Some(first) if first.is_home_page && first.path == "/" => report.pass(file_name(path)),
        Some(first) => report.fail(format!(
            "manifest entry 0 is `{}`, expected the home page",
            first.path
        )),
        None => report.fail("manifest has no pages"),
    }
}

fn verify_sitemaps(output: &Path, report: &mut VerifyReport) {
    let index = match read_sitemap(&output.join(INDEX_FILE)) {
        Ok(ParsedSitemap::Index(index)) => index,
        Ok(ParsedSitemap::UrlSet(_)) => return report.fail(format!("{INDEX_FILE} is not an index")),
        Err(message) => return report.fail(message),
    };
    report.pass(INDEX_FILE);

    for entry in index {
        let Some(name) = entry.loc.rsplit('/').next().filter(|n| !n.is_empty()) else {
            report.fail(format!("index references an invalid location `{}`", entry.loc));
            continue;
        };
        match read_sitemap(&output.join(name)) {
            Ok(ParsedSitemap::UrlSet(_)) => report.pass(name),
            Ok(ParsedSitemap::Index(_)) => report.fail(format!("{name} is a nested index")),
            Err(message) => report.fail(message),
        }
    }
}

fn verify_robots(path: &Path, report: &mut VerifyReport) {
    match fs::read_to_string(path) {
        Ok(text) if has_sitemap_reference(&text) => report.pass(file_name(path)),
        Ok(_) => report.fail(format!("{} has no Sitemap line", file_name(path))),
        Err(err) => report.fail(format!("Failed to read {}: {err}", path.display())),
    }
}

fn read_sitemap(path: &Path) -> Result<ParsedSitemap, String> {
    let xml = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
    parse_sitemap(&xml).map_err(|err| format!("{}: {err:#}", file_name(path)))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

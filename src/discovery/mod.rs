//! Route discovery over the page-definition tree.
//!
//! A directory is a route when it directly contains a page-definition file
//! (see [`PAGE_FILES`]). Its URL is built from the directory names between
//! the tree root and itself, with a few naming conventions:
//!
//! | Directory name     | Effect                                      |
//! |--------------------|---------------------------------------------|
//! | `pricing`          | contributes the `pricing` segment           |
//! | `(marketing)`      | grouping: no segment, still recursed        |
//! | `@modal`           | parallel slot: no segment, still recursed   |
//! | `[slug]`           | dynamic segment, marks the route dynamic    |
//! | `[...slug]`        | catch-all, dynamic                          |
//! | `_private`, `.x`   | not walked                                  |
//!
//! Discovery is recomputed from scratch on every run and yields routes
//! sorted by path.

mod render_mode;

pub use render_mode::{RenderMode, classify_render_mode};

use crate::log;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Recognized page-definition file names, in precedence order.
pub const PAGE_FILES: &[&str] = &[
    "page.tsx", "page.jsx", "page.ts", "page.js", "page.mdx", "page.md",
];

/// Directory names never walked.
const IGNORED_DIRS: &[&str] = &["node_modules"];

// ============================================================================
// Types
// ============================================================================

/// Whether a route has a fixed URL or a parameter placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Static,
    Dynamic,
}

/// One addressable path from the page tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNode {
    /// URL path, `/`-rooted, no trailing slash except the root.
    pub route_path: String,
    pub kind: RouteKind,
    pub render_mode: RenderMode,
    /// Page-definition file that marks the route.
    pub source: PathBuf,
}

impl RouteNode {
    pub fn is_home(&self) -> bool {
        self.route_path == "/"
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == RouteKind::Dynamic
    }

    /// Directory holding the page file (and its sidecar).
    pub fn directory(&self) -> &Path {
        self.source.parent().unwrap_or(Path::new(""))
    }
}

/// Errors that abort discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("page tree `{0}` is not readable")]
    Root(PathBuf, #[source] std::io::Error),
}

// ============================================================================
// Segment Classification
// ============================================================================

/// How a single directory name maps onto the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Dynamic(&'a str),
    Group,
}

fn classify_segment(name: &str) -> Segment<'_> {
    if (name.starts_with('(') && name.ends_with(')')) || name.starts_with('@') {
        Segment::Group
    } else if name.starts_with('[') && name.ends_with(']') {
        Segment::Dynamic(name)
    } else {
        Segment::Literal(name)
    }
}

/// Whether the walker should descend into (or consider) this entry.
fn is_walkable(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    !(name.starts_with('_') || name.starts_with('.') || IGNORED_DIRS.contains(&name.as_ref()))
}

/// Build the route path and kind for a directory relative to the tree root.
fn route_for_dir(relative: &Path) -> (String, RouteKind) {
    let mut kind = RouteKind::Static;
    let mut segments = Vec::new();

    for component in relative.components() {
        let name = component.as_os_str().to_string_lossy();
        match classify_segment(&name) {
            Segment::Group => {}
            Segment::Dynamic(seg) => {
                kind = RouteKind::Dynamic;
                segments.push(seg.to_owned());
            }
            Segment::Literal(seg) => segments.push(seg.to_owned()),
        }
    }

    (format!("/{}", segments.join("/")), kind)
}

// ============================================================================
// Public API
// ============================================================================

/// Walk the page tree and return every route, sorted by path.
///
/// Unreadable subdirectories and page files are logged and skipped; only an
/// unreadable root aborts.
pub fn discover_routes(root: &Path) -> Result<Vec<RouteNode>, DiscoveryError> {
    fs::read_dir(root).map_err(|err| DiscoveryError::Root(root.to_path_buf(), err))?;

    // route path -> (page file precedence, node)
    let mut routes: BTreeMap<String, (usize, RouteNode)> = BTreeMap::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(is_walkable);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map(Path::display);
                match path {
                    Some(path) => log!("discover"; "skipping {path}: {err}"),
                    None => log!("discover"; "skipping entry: {err}"),
                }
                continue;
            }
        };

        // Symlinked page files are read through; dangling ones fail below.
        if entry.file_type().is_dir() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        let Some(precedence) = PAGE_FILES.iter().position(|p| *p == file_name) else {
            continue;
        };

        let source = entry.into_path();
        let dir = source.parent().unwrap_or(root);
        let relative = dir.strip_prefix(root).unwrap_or(Path::new(""));
        let (route_path, kind) = route_for_dir(relative);

        if let Some((existing, node)) = routes.get(&route_path) {
            if node.directory() != dir {
                log!("discover"; "{route_path} defined twice, keeping {}", node.source.display());
                continue;
            }
            if *existing < precedence {
                continue;
            }
        }

        let render_mode = match fs::read(&source) {
            Ok(bytes) => classify_render_mode(&String::from_utf8_lossy(&bytes)),
            Err(err) => {
                log!("discover"; "skipping {}: {err}", source.display());
                continue;
            }
        };

        routes.insert(
            route_path.clone(),
            (
                precedence,
                RouteNode {
                    route_path,
                    kind,
                    render_mode,
                    source,
                },
            ),
        );
    }

    Ok(routes.into_values().map(|(_, node)| node).collect())
}

// ============================================================================
// Tests
// ============================================================================

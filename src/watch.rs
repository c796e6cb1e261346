//! File system watcher for the preview server.
//!
//! Watches the page tree, the content collections and the build output.
//! Source changes trigger a full rebuild; a changed manifest (from that
//! rebuild or from an external `build`) is swapped into the running gate.
//!
//! ```text
//! notify events ──► Debouncer (300ms) ──► handle_changes()
//!                                            │
//!                     pages / content ───────┼──► build_all()
//!                     site-manifest.json ────┴──► Gate::reload()
//! ```
//!
//! The config is a snapshot taken at startup; config edits are reported
//! but need a restart.

use crate::{
    build::{build_all, load_manifest},
    config::SiteConfig,
    gate::Gate,
    log,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::mpsc::{RecvTimeoutError, channel},
    time::{Duration, Instant},
};

// =============================================================================
// Constants
// =============================================================================

const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts, atomic writes).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// What a changed path means for the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Change {
    Source,
    Manifest,
    Config,
    Ignored,
}

fn categorize(path: &Path, config: &SiteConfig) -> Change {
    if path == config.manifest_path() {
        Change::Manifest
    } else if path == config.config_path {
        Change::Config
    } else if path.starts_with(&config.build.pages) || path.starts_with(&config.build.content) {
        Change::Source
    } else {
        Change::Ignored
    }
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    pending: HashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: HashSet::new(),
            last_event: None,
            last_rebuild: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

fn reload_gate(config: &SiteConfig, gate: &Gate) {
    match load_manifest(config) {
        Ok(manifest) => {
            gate.reload(&manifest);
            log!("watch"; "manifest reloaded, {} pages", manifest.pages.len());
        }
        Err(err) => log!("watch"; "manifest reload failed: {err:#}"),
    }
}

/// Process file changes. Returns true if a rebuild ran (for cooldown).
fn handle_changes(paths: &[PathBuf], config: &SiteConfig, gate: &Gate) -> bool {
    let changes: HashSet<Change> = paths.iter().map(|p| categorize(p, config)).collect();

    if changes.contains(&Change::Config) {
        log!("watch"; "config changed, restart to apply");
    }

    if changes.contains(&Change::Source) {
        log!("watch"; "sources changed, rebuilding...");
        match build_all(config) {
            Ok(artifacts) => gate.reload(&artifacts.manifest),
            Err(err) => log!("watch"; "build failed: {err:#}"),
        }
        return true;
    }

    if changes.contains(&Change::Manifest) {
        reload_gate(config, gate);
    }
    false
}

// =============================================================================
// Watcher Setup
// =============================================================================

fn setup_watchers(watcher: &mut impl Watcher, config: &SiteConfig) -> Result<()> {
    let targets = [
        (config.build.pages.as_path(), RecursiveMode::Recursive),
        (config.build.content.as_path(), RecursiveMode::Recursive),
        (config.build.output.as_path(), RecursiveMode::NonRecursive),
        (config.config_path.as_path(), RecursiveMode::NonRecursive),
    ];

    for (path, mode) in targets {
        if path.exists() {
            watcher
                .watch(path, mode)
                .with_context(|| format!("Failed to watch {}", path.display()))?;
        }
    }
    log!("watch"; "watching {}", config.build.pages.display());
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher with debouncing.
pub fn watch_for_changes_blocking(config: &SiteConfig, gate: &Gate) -> Result<()> {
    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, config)?;

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) && !debouncer.in_cooldown() => {
                debouncer.add(event);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                if handle_changes(&debouncer.take(), config, gate) {
                    debouncer.mark_rebuild();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}

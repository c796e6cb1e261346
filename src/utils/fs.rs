//! Artifact file writing.

use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Write `content` to `path` through a sibling temp file and a rename.
///
/// Readers see either the previous file or the complete new one, never a
/// partial write. Parent directories are created as needed.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory {}", parent.display()))?;

    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid artifact path {}", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = parent.join(tmp_name);

    fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| {
        let _ = fs::remove_file(&tmp);
        format!("Failed to replace {}", path.display())
    })?;
    Ok(())
}

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Copies `source` over `destination`, creating parent directories.
///
/// Copying a file onto itself is a no-op.
pub(crate) fn copy_file(source: &Path, destination: &Path) -> Result<()> {
    if is_same_file(source, destination) {
        return Ok(());
    }
    ensure_parent_dir(destination)?;
    fs::copy(source, destination).with_context(|| {
        format!(
            "failed copying file from {} to {}",
            source.display(),
            destination.display()
        )
    })?;
    Ok(())
}

fn is_same_file(left: &Path, right: &Path) -> bool {
    match (fs::canonicalize(left), fs::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

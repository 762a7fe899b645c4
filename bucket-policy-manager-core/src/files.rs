//! Small filesystem helpers shared by the template catalog and the backup store.

use std::path::{Path, PathBuf};

use crate::error::{PolicyManagerError, PolicyManagerResult};

/// Files in `dir` whose name matches `file_pattern`; `dir` itself is matched literally.
pub(crate) fn glob_files(dir: &Path, file_pattern: &str) -> PolicyManagerResult<Vec<PathBuf>> {
    let escaped_dir = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = Path::new(&escaped_dir).join(file_pattern);
    let pattern = pattern.to_string_lossy();

    let entries = glob::glob(&pattern).map_err(|e| {
        PolicyManagerError::policy(format!("Invalid file pattern '{pattern}': {e}"))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => log::warn!("Skipping unreadable path {}: {}", e.path().display(), e),
        }
    }
    Ok(files)
}

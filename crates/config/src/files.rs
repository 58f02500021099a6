use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LoadError, Result};

/// Returns true for `.yaml` and `.yml` files, in any case.
pub fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Rejects an explicitly named config file that is not YAML.
pub fn ensure_yaml(path: &Path) -> Result<()> {
    if is_yaml(path) {
        Ok(())
    } else {
        Err(LoadError::UnsupportedExtension {
            path: path.to_path_buf(),
        })
    }
}

/// Regular files directly under `dir`, sorted by file name.
pub fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }
    let io = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io)? {
        let path = entry.map_err(io)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

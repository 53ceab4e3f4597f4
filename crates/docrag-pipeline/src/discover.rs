use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use docrag_core::{Error, Result};

/// Files under `root` whose lowercase extension is in `extensions`, sorted.
/// A file path is returned as-is when its extension matches.
pub fn discover_documents(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let wanted = |p: &Path| {
        p.extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|w| w.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    };
    if root.is_file() {
        return Ok(if wanted(root) { vec![root.to_path_buf()] } else { Vec::new() });
    }
    if !root.is_dir() {
        return Err(Error::config(format!("documents path {} does not exist", root.display())));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| Error::document_read(root, e))?;
        if entry.file_type().is_file() && wanted(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

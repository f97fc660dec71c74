use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::loader::LoaderRegistry;

/// Files in `folder` whose extension has a registered loader, sorted by name.
/// Subdirectories are not descended into.
pub fn list_data_files(folder: &Path, registry: &LoaderRegistry) -> Result<Vec<PathBuf>> {
    let formats = registry.formats();
    let mut files = Vec::new();

    for entry in std::fs::read_dir(folder).map_err(|e| Error::io(folder, e))? {
        let entry = entry.map_err(|e| Error::io(folder, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = format_of(&path) else {
            continue;
        };
        if formats.iter().any(|f| *f == ext) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Lower-cased extension of `path`, the format tag used by the registry.
pub fn format_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::errors::{Error, Result};

use super::catalog::FeatureCatalog;
use super::descriptor::parse_descriptor;
use super::model::FeatureRecord;

pub const DESCRIPTOR_EXTENSION: &str = "feature";

/// Find every `.feature` file under `root`, sorted.
pub fn find_descriptors(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::Config(format!(
            "feature root {} is not a directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(DESCRIPTOR_EXTENSION)
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Read and parse every descriptor under `root` in parallel.
pub fn load_descriptors(root: &Path) -> Result<Vec<FeatureRecord>> {
    let files = find_descriptors(root)?;
    log::debug!(
        "Parsing {} feature descriptors under {}",
        files.len(),
        root.display()
    );

    files
        .par_iter()
        .map(|path| {
            let text = fs::read_to_string(path).map_err(|e| {
                Error::malformed(Some(path.clone()), format!("cannot read descriptor: {}", e))
            })?;
            parse_descriptor(&text, Some(path))
        })
        .collect()
}

/// Load descriptors under `root` and build the catalog from them.
pub fn load_catalog(root: &Path) -> Result<FeatureCatalog> {
    FeatureCatalog::build(load_descriptors(root)?)
}

//! Shared loading for commands that take changed paths.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::InputArgs;
use crate::config::{load_config, load_config_from_path, FatscopeConfig};
use crate::detector::ChangeDetector;
use crate::vcs::{ChangeSource, GitDiff, PathList};

/// Load the explicit config file, or the nearest `.fatscope.toml` above `start`.
pub fn resolve_config(start: &Path, explicit: Option<&Path>) -> Result<FatscopeConfig> {
    match explicit {
        Some(path) => Ok(load_config_from_path(path)?),
        None => Ok(load_config(start)?),
    }
}

fn path_setting(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Config for `args` with the command-line layout overrides applied.
pub fn effective_config(args: &InputArgs) -> Result<FatscopeConfig> {
    let mut config = resolve_config(&args.repo, args.config.as_deref())?;
    if let Some(root) = &args.feature_root {
        config.layout.feature_root = path_setting(root);
    }
    if let Some(snapshot) = &args.snapshot {
        config.layout.snapshot = path_setting(snapshot);
    }
    Ok(config)
}

pub fn load_detector(args: &InputArgs) -> Result<ChangeDetector> {
    let config = effective_config(args)?;
    ChangeDetector::from_config(&config, &args.repo).map_err(|e| {
        let what = if e.is_catalog_error() {
            "feature descriptors"
        } else {
            "feature model"
        };
        anyhow::Error::new(e).context(format!(
            "Failed to load the {} under {}",
            what,
            args.repo.display()
        ))
    })
}

fn read_path_list(source: &Path) -> Result<PathList> {
    if source.as_os_str() == "-" {
        return Ok(PathList::from_reader(io::stdin().lock())?);
    }
    PathList::from_file(source)
        .with_context(|| format!("Failed to read changed paths from {}", source.display()))
}

/// Changed paths from the positional list, `--paths-from` and `--base`,
/// merged and deduplicated.
pub fn gather_paths(args: &InputArgs) -> Result<Vec<String>> {
    let mut list = PathList::new(args.paths.iter().cloned());
    if let Some(source) = &args.paths_from {
        list.extend(read_path_list(source)?.changed_paths()?);
    }
    if let Some(base) = &args.base {
        let mut diff = GitDiff::new(&args.repo, base.clone());
        if let Some(head) = &args.head {
            diff = diff.with_head(head.clone());
        }
        list.extend(diff.changed_paths()?);
    }
    if list.is_empty() {
        log::warn!("No changed paths given; every bucket will be selected");
    }
    Ok(list.changed_paths()?)
}

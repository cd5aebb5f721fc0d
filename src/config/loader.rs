use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::FatscopeConfig;
use crate::errors::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".fatscope.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse config from a TOML string
pub fn parse_config(contents: &str) -> Result<FatscopeConfig> {
    Ok(toml::from_str::<FatscopeConfig>(contents)?)
}

/// Try loading config from a specific path.
///
/// A missing file is `Ok(None)`. A file that exists but cannot be read or
/// parsed is an error naming it.
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Result<Option<FatscopeConfig>> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::Config(format!(
                "cannot read {}: {}",
                config_path.display(),
                e
            )))
        }
    };

    let config = parse_config(&contents)
        .map_err(|e| Error::Config(format!("invalid {}: {}", config_path.display(), e)))?;
    log::debug!("Loaded config from {}", config_path.display());
    Ok(Some(config))
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search `start` and its ancestors for `.fatscope.toml`.
///
/// Falls back to defaults only when no file exists. The nearest file that
/// exists must be valid.
pub fn load_config(start: &Path) -> Result<FatscopeConfig> {
    let start = start
        .canonicalize()
        .unwrap_or_else(|_| start.to_path_buf());
    for dir in directory_ancestors(start, MAX_TRAVERSAL_DEPTH) {
        if let Some(config) = try_load_config_from_path(&dir.join(CONFIG_FILE_NAME))? {
            return Ok(config);
        }
    }
    log::debug!(
        "No config found after checking {} directories. Using default config.",
        MAX_TRAVERSAL_DEPTH
    );
    Ok(FatscopeConfig::default())
}

/// Load an explicitly requested config file. Unlike [`load_config`], a
/// missing file is an error too.
pub fn load_config_from_path(path: &Path) -> Result<FatscopeConfig> {
    try_load_config_from_path(path)?
        .ok_or_else(|| Error::Config(format!("cannot read {}: file not found", path.display())))
}

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE_NAME;

const DEFAULT_CONFIG: &str = r#"# fatscope configuration

[layout]
# Directories whose immediate children are projects
project_roots = ["dev"]
# Projects that hold feature descriptors
feature_projects = ["com.ibm.websphere.appserver.features"]
visibility_dirs = ["public", "protected", "private", "auto"]
# Relative to the repository root
feature_root = "dev/com.ibm.websphere.appserver.features/visibility"
snapshot = "dev/fattest.simplicity/fat-features.json"

[classification]
# Uncomment to replace the built-in lists.
# infra_projects = ["build", "build.*", "cnf", "fattest.simplicity", "*_fat.common"]
# infra_paths = [".github/**", "**/*.gradle", "**/*.lock", "**/*.lockfile"]
# fat_project_pattern = '_fat([._][A-Za-z0-9_.]*)?$'
# unit_project_pattern = '_(test|bvt)$'
# test_dirs = ["test", "test-bvt", "test-resources"]
# metadata_files = ["**/.classpath", "**/.project", "**/.settings/**"]

[bundles.aliases]
# Projects whose bundle symbolic names differ from the directory name
# "com.ibm.ws.jdbc.internal" = ["com.ibm.ws.jdbc"]

[selection]
# Buckets added to every selection that is not ALL
always_include = []
"#;

/// Write the default configuration into `dir`.
pub fn write_default_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "Configuration file {} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    Ok(config_path)
}

pub fn init_config(force: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let path = write_default_config(&cwd, force)?;
    println!("Created {} configuration file", path.display());
    Ok(())
}

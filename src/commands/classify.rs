use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use super::input::resolve_config;
use crate::classify::PathClassifier;
use crate::output::{self, OutputFormat};

pub fn classify_paths(paths: &[String], config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let config = resolve_config(&cwd, config)?;
    let classifier = PathClassifier::from_config(&config)?;
    let classifications = classifier.classify_all(paths);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    output::write_classifications(&mut out, &classifications, format)
}

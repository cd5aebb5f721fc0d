//! Sources of changed paths.
//!
//! The detector only needs repository-relative paths with `/` separators;
//! these types produce them from a git diff or from an explicit list.

use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use git2::{DiffOptions, Repository, Tree};

use crate::errors::{Error, Result};

pub trait ChangeSource {
    /// Changed paths, sorted and without duplicates.
    fn changed_paths(&self) -> Result<Vec<String>>;
}

/// Paths changed between two revisions, or between a revision and the
/// working tree when no head is given.
///
/// Renames contribute both the old and the new path.
#[derive(Debug, Clone)]
pub struct GitDiff {
    repo: PathBuf,
    base: String,
    head: Option<String>,
}

impl GitDiff {
    pub fn new(repo: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            base: base.into(),
            head: None,
        }
    }

    pub fn with_head(mut self, head: impl Into<String>) -> Self {
        self.head = Some(head.into());
        self
    }

    fn open(&self) -> Result<Repository> {
        Repository::discover(&self.repo).map_err(|e| {
            Error::Config(format!(
                "no git repository at {}: {}",
                self.repo.display(),
                e.message()
            ))
        })
    }
}

fn resolve_tree<'r>(repo: &'r Repository, rev: &str) -> Result<Tree<'r>> {
    repo.revparse_single(rev)
        .and_then(|object| object.peel_to_tree())
        .map_err(|e| Error::Config(format!("cannot resolve revision [ {} ]: {}", rev, e.message())))
}

impl ChangeSource for GitDiff {
    fn changed_paths(&self) -> Result<Vec<String>> {
        let repo = self.open()?;
        let base = resolve_tree(&repo, &self.base)?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);

        let mut diff = match &self.head {
            Some(head) => {
                let head = resolve_tree(&repo, head)?;
                repo.diff_tree_to_tree(Some(&base), Some(&head), Some(&mut opts))?
            }
            None => repo.diff_tree_to_workdir_with_index(Some(&base), Some(&mut opts))?,
        };
        diff.find_similar(None)?;

        let mut paths = Vec::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                if let Some(path) = file.path() {
                    paths.push(path_to_string(path));
                }
            }
        }
        paths.sort();
        paths.dedup();

        log::info!(
            "{} paths changed between {} and {}",
            paths.len(),
            self.base,
            self.head.as_deref().unwrap_or("the working tree")
        );
        Ok(paths)
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// An explicit list of changed paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathList {
    paths: Vec<String>,
}

impl PathList {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        list.extend(paths);
        list
    }

    /// One path per line; blank lines and `#` comments are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut list = Self::default();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            list.paths.push(line.to_string());
        }
        Ok(list)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn extend<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(
            paths
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.trim().is_empty()),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl ChangeSource for PathList {
    fn changed_paths(&self) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self.paths.iter().map(|p| p.trim().to_string()).collect();
        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}

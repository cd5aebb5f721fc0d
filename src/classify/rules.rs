//! Built-in classification rules.
//!
//! Each rule is a predicate plus the category it assigns. The classifier
//! evaluates them in order and the first match wins.

use std::fmt;

use glob::{MatchOptions, Pattern};
use regex::Regex;

use super::{ChangedPath, FileCategory};
use crate::errors::Result;

/// A single (predicate, category) entry of the classifier's rule table.
pub trait ClassificationRule: fmt::Debug + Send + Sync {
    /// Short identifier shown by `fatscope classify -v` and `explain`
    fn name(&self) -> &str;

    fn category(&self) -> FileCategory;

    fn matches(&self, path: &ChangedPath) -> bool;

    /// Test bucket owned by a matching path, if the rule knows it.
    fn owning_bucket(&self, _path: &ChangedPath) -> Option<String> {
        None
    }
}

pub(crate) fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

pub(crate) fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(Into::into))
        .collect()
}

/// Matches the project directory name against glob patterns.
#[derive(Debug)]
pub struct ProjectGlobRule {
    name: String,
    category: FileCategory,
    patterns: Vec<Pattern>,
}

impl ProjectGlobRule {
    pub fn new(name: impl Into<String>, category: FileCategory, patterns: &[String]) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            category,
            patterns: compile_patterns(patterns)?,
        })
    }
}

impl ClassificationRule for ProjectGlobRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> FileCategory {
        self.category
    }

    fn matches(&self, path: &ChangedPath) -> bool {
        match path.project() {
            Some(project) => self
                .patterns
                .iter()
                .any(|p| p.matches_with(project, match_options())),
            None => false,
        }
    }
}

/// Matches the whole repository-relative path against glob patterns.
#[derive(Debug)]
pub struct PathGlobRule {
    name: String,
    category: FileCategory,
    patterns: Vec<Pattern>,
}

impl PathGlobRule {
    pub fn new(name: impl Into<String>, category: FileCategory, patterns: &[String]) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            category,
            patterns: compile_patterns(patterns)?,
        })
    }
}

impl ClassificationRule for PathGlobRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> FileCategory {
        self.category
    }

    fn matches(&self, path: &ChangedPath) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(path.as_str(), match_options()))
    }
}

/// Matches project names by regex; the project itself is the owning bucket.
#[derive(Debug)]
pub struct BucketProjectRule {
    name: String,
    category: FileCategory,
    pattern: Regex,
}

impl BucketProjectRule {
    pub fn new(name: impl Into<String>, category: FileCategory, pattern: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            category,
            pattern: Regex::new(pattern)?,
        })
    }
}

impl ClassificationRule for BucketProjectRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> FileCategory {
        self.category
    }

    fn matches(&self, path: &ChangedPath) -> bool {
        path.project().is_some_and(|p| self.pattern.is_match(p))
    }

    fn owning_bucket(&self, path: &ChangedPath) -> Option<String> {
        path.project().map(str::to_string)
    }
}

/// Paths whose first directory inside the project is a test directory.
#[derive(Debug)]
pub struct TestDirRule {
    dirs: Vec<String>,
}

impl TestDirRule {
    pub fn new(dirs: &[String]) -> Self {
        Self {
            dirs: dirs.to_vec(),
        }
    }
}

impl ClassificationRule for TestDirRule {
    fn name(&self) -> &str {
        "test-dir"
    }

    fn category(&self) -> FileCategory {
        FileCategory::UnitOrBvtTest
    }

    fn matches(&self, path: &ChangedPath) -> bool {
        match path.project_dir() {
            Some(dir) => self.dirs.iter().any(|d| d == dir),
            None => false,
        }
    }
}

/// Anything under `<feature root>/<visibility>/`.
#[derive(Debug)]
pub struct FeatureDescriptorRule {
    prefixes: Vec<String>,
}

impl FeatureDescriptorRule {
    pub fn new(feature_root: &str, visibility_dirs: &[String]) -> Self {
        let root = feature_root.trim_matches('/');
        Self {
            prefixes: visibility_dirs
                .iter()
                .map(|vis| format!("{}/{}/", root, vis.trim_matches('/')))
                .collect(),
        }
    }

    /// Path below the visibility directory, e.g. `jsonb-1.0/jsonb-1.0.feature`.
    pub fn descriptor_subpath<'p>(&self, path: &'p ChangedPath) -> Option<&'p str> {
        self.prefixes
            .iter()
            .find_map(|prefix| path.as_str().strip_prefix(prefix.as_str()))
            .filter(|rest| !rest.is_empty())
    }
}

impl ClassificationRule for FeatureDescriptorRule {
    fn name(&self) -> &str {
        "feature-descriptor"
    }

    fn category(&self) -> FileCategory {
        FileCategory::ProductFeature
    }

    fn matches(&self, path: &ChangedPath) -> bool {
        self.descriptor_subpath(path).is_some()
    }
}

/// Any path inside a recognised project directory.
#[derive(Debug)]
pub struct AnyProjectRule;

impl ClassificationRule for AnyProjectRule {
    fn name(&self) -> &str {
        "project"
    }

    fn category(&self) -> FileCategory {
        FileCategory::Product
    }

    fn matches(&self, path: &ChangedPath) -> bool {
        path.project().is_some()
    }
}

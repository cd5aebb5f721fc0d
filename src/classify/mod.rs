//! Changed-path classification.
//!
//! [`PathClassifier`] maps a repository-relative path to exactly one
//! [`FileCategory`] by walking an ordered rule table; the first rule that
//! matches decides. Classification never fails: a path no rule recognises
//! is [`FileCategory::Unknown`].

pub mod rules;

use std::fmt;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::FatscopeConfig;
use crate::errors::Result;

pub use rules::{
    AnyProjectRule, BucketProjectRule, ClassificationRule, FeatureDescriptorRule, PathGlobRule,
    ProjectGlobRule, TestDirRule,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    ProductFeature,
    Product,
    FatTest,
    UnitOrBvtTest,
    Infra,
    Unknown,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductFeature => "product_feature",
            Self::Product => "product",
            Self::FatTest => "fat_test",
            Self::UnitOrBvtTest => "unit_or_bvt_test",
            Self::Infra => "infra",
            Self::Unknown => "unknown",
        }
    }

    /// Changes in this category cannot be modelled and select every bucket.
    pub fn selects_everything(&self) -> bool {
        matches!(self, Self::Infra | Self::Unknown)
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Self::FatTest | Self::UnitOrBvtTest)
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalised repository-relative path plus its owning project, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangedPath {
    path: String,
    /// Byte range of the project segment within `path`
    project: Option<(usize, usize)>,
}

impl Serialize for ChangedPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path)
    }
}

impl ChangedPath {
    /// Normalise `raw` and locate its project below one of `project_roots`.
    ///
    /// Backslashes become `/`, leading `./` and `/` are dropped. A project is
    /// the directory directly below a project root, and only counts when the
    /// path continues inside it.
    pub fn parse(raw: &str, project_roots: &[String]) -> Self {
        let path = normalize(raw);
        let project = project_roots
            .iter()
            .find_map(|root| project_span(&path, root.trim_matches('/')));
        Self { path, project }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn project(&self) -> Option<&str> {
        self.project.map(|(start, end)| &self.path[start..end])
    }

    /// Path inside the project directory.
    pub fn within_project(&self) -> Option<&str> {
        self.project.map(|(_, end)| &self.path[end + 1..])
    }

    /// First directory inside the project, if the path goes that deep.
    pub fn project_dir(&self) -> Option<&str> {
        let within = self.within_project()?;
        within.split_once('/').map(|(dir, _)| dir)
    }
}

impl fmt::Display for ChangedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

fn normalize(raw: &str) -> String {
    let mut path = raw.trim().replace('\\', "/");
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest.to_string();
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest.to_string();
        } else {
            break;
        }
    }
    path
}

fn project_span(path: &str, root: &str) -> Option<(usize, usize)> {
    let start = if root.is_empty() {
        0
    } else {
        let rest = path.strip_prefix(root)?.strip_prefix('/')?;
        path.len() - rest.len()
    };
    let end = start + path[start..].find('/')?;
    if end == start || end + 1 >= path.len() {
        return None;
    }
    Some((start, end))
}

/// Outcome of classifying one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub path: ChangedPath,
    pub category: FileCategory,
    /// Name of the rule that decided, `None` for the fallback
    pub rule: Option<String>,
    /// Bucket owned by the path, for test projects
    pub bucket: Option<String>,
}

/// Ordered rule table over changed paths.
#[derive(Debug)]
pub struct PathClassifier {
    project_roots: Vec<String>,
    descriptors: FeatureDescriptorRule,
    rules: Vec<Box<dyn ClassificationRule>>,
}

impl PathClassifier {
    /// Build the default rule table from configuration.
    ///
    /// Invalid glob or regex values fail here, not at classification time.
    pub fn from_config(config: &FatscopeConfig) -> Result<Self> {
        let layout = &config.layout;
        let classification = &config.classification;

        let rules: Vec<Box<dyn ClassificationRule>> = vec![
            Box::new(ProjectGlobRule::new(
                "infra-project",
                FileCategory::Infra,
                &classification.infra_projects,
            )?),
            Box::new(PathGlobRule::new(
                "infra-path",
                FileCategory::Infra,
                &classification.infra_paths,
            )?),
            Box::new(BucketProjectRule::new(
                "fat-project",
                FileCategory::FatTest,
                &classification.fat_project_pattern,
            )?),
            Box::new(BucketProjectRule::new(
                "unit-project",
                FileCategory::UnitOrBvtTest,
                &classification.unit_project_pattern,
            )?),
            Box::new(TestDirRule::new(&classification.test_dirs)),
            Box::new(PathGlobRule::new(
                "metadata",
                FileCategory::UnitOrBvtTest,
                &classification.metadata_files,
            )?),
            Box::new(FeatureDescriptorRule::new(
                &layout.feature_root,
                &layout.visibility_dirs,
            )),
            Box::new(ProjectGlobRule::new(
                "feature-project",
                FileCategory::Infra,
                &layout.feature_projects,
            )?),
            Box::new(AnyProjectRule),
        ];

        Ok(Self {
            project_roots: layout.project_roots.clone(),
            descriptors: FeatureDescriptorRule::new(&layout.feature_root, &layout.visibility_dirs),
            rules,
        })
    }

    /// A classifier with no rules; everything is `Unknown` until rules are pushed.
    pub fn empty(project_roots: Vec<String>) -> Self {
        Self {
            project_roots,
            descriptors: FeatureDescriptorRule::new("", &[]),
            rules: Vec::new(),
        }
    }

    /// Append a rule after the existing ones.
    pub fn push_rule(&mut self, rule: Box<dyn ClassificationRule>) {
        self.rules.push(rule);
    }

    /// Insert a rule ahead of every existing rule.
    pub fn prepend_rule(&mut self, rule: Box<dyn ClassificationRule>) {
        self.rules.insert(0, rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn parse_path(&self, raw: &str) -> ChangedPath {
        ChangedPath::parse(raw, &self.project_roots)
    }

    pub fn classify(&self, raw: &str) -> FileCategory {
        self.classify_path(self.parse_path(raw)).category
    }

    pub fn classify_path(&self, path: ChangedPath) -> Classification {
        match self.rules.iter().find(|rule| rule.matches(&path)) {
            Some(rule) => Classification {
                category: rule.category(),
                rule: Some(rule.name().to_string()),
                bucket: rule.owning_bucket(&path),
                path,
            },
            None => Classification {
                path,
                category: FileCategory::Unknown,
                rule: None,
                bucket: None,
            },
        }
    }

    /// Classify a batch in parallel, preserving input order.
    pub fn classify_all<S>(&self, paths: &[S]) -> Vec<Classification>
    where
        S: AsRef<str> + Sync,
    {
        let results: Vec<Classification> = paths
            .par_iter()
            .map(|raw| self.classify_path(self.parse_path(raw.as_ref())))
            .collect();
        log::debug!("Classified {} changed paths", results.len());
        results
    }

    /// Path of a changed descriptor-tree file below its visibility directory.
    pub fn descriptor_subpath<'p>(&self, path: &'p ChangedPath) -> Option<&'p str> {
        self.descriptors.descriptor_subpath(path)
    }
}

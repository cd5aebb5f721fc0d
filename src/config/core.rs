use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration structure for fatscope
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FatscopeConfig {
    /// Repository layout: where projects, features and the snapshot live
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Path classification rules
    #[serde(default)]
    pub classification: ClassificationConfig,

    /// Project to bundle mapping overrides
    #[serde(default)]
    pub bundles: BundlesConfig,

    /// Bucket selection policy
    #[serde(default)]
    pub selection: SelectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    /// Directories whose immediate children are projects
    #[serde(default = "default_project_roots")]
    pub project_roots: Vec<String>,

    /// Projects holding feature descriptors
    #[serde(default = "default_feature_projects")]
    pub feature_projects: Vec<String>,

    /// Visibility subdirectories that contain descriptors
    #[serde(default = "default_visibility_dirs")]
    pub visibility_dirs: Vec<String>,

    /// Descriptor tree, relative to the repository root
    #[serde(default = "default_feature_root")]
    pub feature_root: String,

    /// Bucket snapshot, relative to the repository root
    #[serde(default = "default_snapshot")]
    pub snapshot: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            project_roots: default_project_roots(),
            feature_projects: default_feature_projects(),
            visibility_dirs: default_visibility_dirs(),
            feature_root: default_feature_root(),
            snapshot: default_snapshot(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationConfig {
    /// Glob patterns over project names that are shared infrastructure.
    /// Checked before the bucket suffix rules.
    #[serde(default = "default_infra_projects")]
    pub infra_projects: Vec<String>,

    /// Glob patterns over whole paths that are infrastructure
    #[serde(default = "default_infra_paths")]
    pub infra_paths: Vec<String>,

    /// Regex a project name must match to be a FAT bucket
    #[serde(default = "default_fat_project_pattern")]
    pub fat_project_pattern: String,

    /// Regex a project name must match to be a unit or BVT test project
    #[serde(default = "default_unit_project_pattern")]
    pub unit_project_pattern: String,

    /// Directories inside a product project that hold unit tests
    #[serde(default = "default_test_dirs")]
    pub test_dirs: Vec<String>,

    /// Glob patterns over whole paths for dependency and CI metadata files
    #[serde(default = "default_metadata_files")]
    pub metadata_files: Vec<String>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            infra_projects: default_infra_projects(),
            infra_paths: default_infra_paths(),
            fat_project_pattern: default_fat_project_pattern(),
            unit_project_pattern: default_unit_project_pattern(),
            test_dirs: default_test_dirs(),
            metadata_files: default_metadata_files(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BundlesConfig {
    /// Project directory name -> bundle ids it produces, for projects whose
    /// bundle symbolic names differ from the directory name
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SelectionConfig {
    /// Buckets added to every finite selection
    #[serde(default)]
    pub always_include: Vec<String>,
}

pub fn default_project_roots() -> Vec<String> {
    vec!["dev".to_string()]
}

pub fn default_feature_projects() -> Vec<String> {
    vec!["com.ibm.websphere.appserver.features".to_string()]
}

pub fn default_visibility_dirs() -> Vec<String> {
    ["public", "protected", "private", "auto"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_feature_root() -> String {
    "dev/com.ibm.websphere.appserver.features/visibility".to_string()
}

pub fn default_snapshot() -> String {
    "dev/fattest.simplicity/fat-features.json".to_string()
}

pub fn default_infra_projects() -> Vec<String> {
    [
        "build",
        "build.*",
        "cnf",
        "wlp-gradle",
        "fattest.simplicity",
        "com.ibm.ws.componenttest*",
        "com.ibm.ws.featureverifier",
        "*_fat.common",
        "*_fat.common.*",
        "*.fat.common",
        "*.fat.common.*",
        "*_fat_shared",
        "*_fat*.commonTest",
        "*_test.fw",
        "com.ibm.ws.jpa.tests.spec10.relationships.*",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_infra_paths() -> Vec<String> {
    [
        ".github/**",
        "**/*.gradle",
        "**/gradle.properties",
        "**/gradle/**",
        "**/*.lock",
        "**/*.lockfile",
        "dev/com.ibm.websphere.appserver.features/*",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_fat_project_pattern() -> String {
    r"_fat([._][A-Za-z0-9_.]*)?$".to_string()
}

pub fn default_unit_project_pattern() -> String {
    r"_(test|bvt)$".to_string()
}

pub fn default_test_dirs() -> Vec<String> {
    ["test", "test-bvt", "test-resources"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_metadata_files() -> Vec<String> {
    ["**/.classpath", "**/.project", "**/.settings/**"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

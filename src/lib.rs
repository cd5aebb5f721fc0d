//! fatscope selects the FAT test buckets a change set needs to run.
//!
//! Changed paths are classified, mapped to the bundles and features they
//! touch, expanded through the feature dependency graph, and finally matched
//! against the features each bucket exercises. Anything that cannot be
//! modelled selects every bucket.

pub mod buckets;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod detector;
pub mod errors;
pub mod features;
pub mod graph;
pub mod impact;
pub mod output;
pub mod vcs;

// Re-export commonly used types
pub use crate::buckets::{BucketId, BucketSelection, TestBucket, TestBucketIndex};
pub use crate::classify::{Classification, FileCategory, PathClassifier};
pub use crate::config::{load_config, FatscopeConfig};
pub use crate::detector::{AllReason, ChangeDetector, ChangeReport};
pub use crate::errors::{Error, Result};
pub use crate::features::{
    load_catalog, ActivationCondition, BundleId, Feature, FeatureCatalog, FeatureId,
    FeatureRecord, ToleranceGroup, Visibility,
};
pub use crate::graph::FeatureGraph;
pub use crate::impact::{Impact, ImpactCause, ImpactResolver};
pub use crate::vcs::{ChangeSource, GitDiff, PathList};

//! Change detection: from changed paths to the buckets that must run.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::buckets::{load_snapshot, BucketId, BucketSelection, FallbackReason, TestBucketIndex};
use crate::classify::{Classification, FileCategory, PathClassifier};
use crate::config::FatscopeConfig;
use crate::errors::{Error, Result};
use crate::features::{load_catalog, BundleId, FeatureCatalog, FeatureId};
use crate::graph::FeatureGraph;
use crate::impact::{Impact, ImpactResolver};

const DESCRIPTOR_SUFFIX: &str = ".feature";

/// Why a run selects every bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AllReason {
    NoChanges,
    UnmodelledChange { path: String, category: FileCategory },
    NoAffectedFeatures,
    UnknownFeature { feature: FeatureId },
}

impl fmt::Display for AllReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChanges => f.write_str("no changed paths were given"),
            Self::UnmodelledChange { path, category } => {
                write!(f, "[ {} ] is classified {} and cannot be modelled", path, category)
            }
            Self::NoAffectedFeatures => f.write_str("no specific feature was identified as affected"),
            Self::UnknownFeature { feature } => {
                write!(f, "feature [ {} ] is not in the catalog", feature)
            }
        }
    }
}

impl From<FallbackReason> for AllReason {
    fn from(reason: FallbackReason) -> Self {
        match reason {
            FallbackReason::NoAffectedFeatures => Self::NoAffectedFeatures,
            FallbackReason::UnknownFeature(feature) => Self::UnknownFeature { feature },
        }
    }
}

/// Every intermediate of one change analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub classifications: Vec<Classification>,
    /// Buckets whose own sources changed
    pub direct_buckets: BTreeSet<BucketId>,
    pub changed_bundles: BTreeSet<BundleId>,
    pub changed_features: BTreeSet<FeatureId>,
    pub impact: Impact,
    pub selection: BucketSelection,
    pub all_reason: Option<AllReason>,
}

impl ChangeReport {
    fn everything(classifications: Vec<Classification>, reason: AllReason) -> Self {
        log::info!("Selecting all buckets: {}", reason);
        Self {
            classifications,
            direct_buckets: BTreeSet::new(),
            changed_bundles: BTreeSet::new(),
            changed_features: BTreeSet::new(),
            impact: Impact::default(),
            selection: BucketSelection::All,
            all_reason: Some(reason),
        }
    }

    /// Count of changed paths per category.
    pub fn category_counts(&self) -> BTreeMap<FileCategory, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.classifications {
            *counts.entry(c.category).or_insert(0) += 1;
        }
        counts
    }
}

/// Orchestrates classification, impact resolution and bucket lookup.
///
/// Holds only immutable state, so one detector can serve any number of
/// concurrent queries.
#[derive(Debug)]
pub struct ChangeDetector {
    classifier: PathClassifier,
    graph: FeatureGraph,
    index: TestBucketIndex,
    descriptors: DescriptorIndex,
    aliases: BTreeMap<String, Vec<BundleId>>,
    always_include: BTreeSet<BucketId>,
}

/// Where each catalog feature was loaded from, keyed for changed-path lookups.
#[derive(Debug, Default)]
struct DescriptorIndex {
    /// descriptor file name -> (source, feature)
    files: HashMap<String, Vec<(PathBuf, FeatureId)>>,
    /// name of the directory holding a descriptor -> feature (lowest id wins)
    dirs: HashMap<String, FeatureId>,
}

impl DescriptorIndex {
    fn new(catalog: &FeatureCatalog) -> Self {
        let mut index = Self::default();
        for id in catalog.ids() {
            let source = match catalog.get(id).and_then(|f| f.source.as_deref()) {
                Some(source) => source,
                None => continue,
            };
            if let Some(name) = source.file_name() {
                index
                    .files
                    .entry(name.to_string_lossy().into_owned())
                    .or_default()
                    .push((source.to_path_buf(), id.to_string()));
            }
            if let Some(dir) = source.parent().and_then(Path::file_name) {
                index
                    .dirs
                    .entry(dir.to_string_lossy().into_owned())
                    .or_insert_with(|| id.to_string());
            }
        }
        index
    }

    /// Feature whose source file ends with `relative`.
    fn by_source(&self, relative: &Path) -> Option<&FeatureId> {
        let name = relative.file_name()?.to_string_lossy();
        self.files
            .get(name.as_ref())?
            .iter()
            .find(|(source, _)| source.ends_with(relative))
            .map(|(_, id)| id)
    }

    fn by_dir(&self, dir: &str) -> Option<&FeatureId> {
        self.dirs.get(dir)
    }
}

impl ChangeDetector {
    pub fn new(classifier: PathClassifier, graph: FeatureGraph, index: TestBucketIndex) -> Self {
        let stale = index.stale_features(graph.catalog());
        if !stale.is_empty() {
            log::debug!(
                "{} bucket feature entries are not in the catalog (first: {} -> {})",
                stale.len(),
                stale[0].0,
                stale[0].1
            );
        }
        let descriptors = DescriptorIndex::new(graph.catalog());
        Self {
            classifier,
            graph,
            index,
            descriptors,
            aliases: BTreeMap::new(),
            always_include: BTreeSet::new(),
        }
    }

    /// Load the catalog and snapshot named by `config`, relative to `repo_root`.
    pub fn from_config(config: &FatscopeConfig, repo_root: &Path) -> Result<Self> {
        let classifier = PathClassifier::from_config(config)?;
        let catalog = load_catalog(&repo_root.join(&config.layout.feature_root))?;
        let index = load_snapshot(&repo_root.join(&config.layout.snapshot))?;
        Ok(Self::new(classifier, FeatureGraph::new(catalog), index)
            .with_aliases(config.bundles.aliases.clone())
            .with_always_include(config.selection.always_include.clone()))
    }

    /// Map project directories to the bundle ids they build.
    pub fn with_aliases(mut self, aliases: BTreeMap<String, Vec<BundleId>>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Buckets added to every finite selection.
    pub fn with_always_include<I, S>(mut self, buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<BucketId>,
    {
        self.always_include = buckets.into_iter().map(Into::into).collect();
        self
    }

    pub fn classifier(&self) -> &PathClassifier {
        &self.classifier
    }

    pub fn graph(&self) -> &FeatureGraph {
        &self.graph
    }

    pub fn index(&self) -> &TestBucketIndex {
        &self.index
    }

    pub fn fats_to_run<S>(&self, paths: &[S]) -> Result<BucketSelection>
    where
        S: AsRef<str> + Sync,
    {
        Ok(self.analyze(paths)?.selection)
    }

    pub fn should_run<S>(&self, bucket: &str, paths: &[S]) -> Result<bool>
    where
        S: AsRef<str> + Sync,
    {
        Ok(self.fats_to_run(paths)?.includes(bucket))
    }

    /// Classify `paths`, resolve their impact and select buckets.
    ///
    /// Fails with `UnknownBundle` when a product path's project builds no
    /// bundle the catalog knows.
    pub fn analyze<S>(&self, paths: &[S]) -> Result<ChangeReport>
    where
        S: AsRef<str> + Sync,
    {
        let classifications = self.classifier.classify_all(paths);
        if classifications.is_empty() {
            return Ok(ChangeReport::everything(classifications, AllReason::NoChanges));
        }
        if let Some(c) = classifications
            .iter()
            .find(|c| c.category.selects_everything())
        {
            let reason = AllReason::UnmodelledChange {
                path: c.path.to_string(),
                category: c.category,
            };
            return Ok(ChangeReport::everything(classifications, reason));
        }

        let mut direct_buckets = BTreeSet::new();
        let mut changed_bundles = BTreeSet::new();
        let mut changed_features = BTreeSet::new();

        for c in &classifications {
            match c.category {
                FileCategory::FatTest | FileCategory::UnitOrBvtTest => {
                    direct_buckets.extend(c.bucket.iter().cloned());
                }
                FileCategory::Product => {
                    changed_bundles.extend(self.bundles_for(c)?);
                }
                FileCategory::ProductFeature => {
                    if let Some(feature) = self.feature_for(c) {
                        changed_features.insert(feature);
                    }
                }
                FileCategory::Infra | FileCategory::Unknown => {}
            }
        }

        log::debug!(
            "Changes: {} direct buckets, {} bundles, {} features",
            direct_buckets.len(),
            changed_bundles.len(),
            changed_features.len()
        );

        let resolver = ImpactResolver::new(&self.graph);
        let impact = resolver.resolve(&changed_bundles, &changed_features);

        let (selection, all_reason) = if changed_bundles.is_empty() && changed_features.is_empty() {
            (BucketSelection::none(), None)
        } else {
            let mut query = impact.features();
            query.extend(changed_features.iter().cloned());
            match self.index.matching_buckets(&self.graph, &query) {
                Ok(buckets) => (BucketSelection::Only { buckets }, None),
                Err(reason) => (BucketSelection::All, Some(AllReason::from(reason))),
            }
        };

        let mut selection = selection;
        selection.extend(direct_buckets.iter().cloned());
        selection.extend(self.always_include.iter().cloned());

        match &all_reason {
            Some(reason) => log::info!("Selecting all buckets: {}", reason),
            None => log::info!(
                "Selected {} buckets from {} affected features",
                selection.buckets().map_or(0, BTreeSet::len),
                impact.len()
            ),
        }

        Ok(ChangeReport {
            classifications,
            direct_buckets,
            changed_bundles,
            changed_features,
            impact,
            selection,
            all_reason,
        })
    }

    fn bundles_for(&self, c: &Classification) -> Result<Vec<BundleId>> {
        let project = match c.path.project() {
            Some(project) => project,
            None => return Err(Error::unknown_bundle(c.path.as_str(), "")),
        };

        let candidates: Vec<BundleId> = match self.aliases.get(project) {
            Some(bundles) => bundles.clone(),
            None => vec![project.to_string()],
        };
        let known: Vec<BundleId> = candidates
            .into_iter()
            .filter(|b| self.graph.is_known_bundle(b))
            .collect();

        if known.is_empty() {
            log::error!(
                "Changed file {} belongs to project {} which no feature requires",
                c.path,
                project
            );
            return Err(Error::unknown_bundle(c.path.as_str(), project));
        }
        Ok(known)
    }

    /// Feature id for a changed file in the descriptor tree.
    ///
    /// Prefers the catalog entry loaded from the same file, then a catalog
    /// lookup of the descriptor name or feature directory. An unresolved
    /// name is returned as is so the bucket query treats it as unknown.
    fn feature_for(&self, c: &Classification) -> Option<FeatureId> {
        let subpath = self.classifier.descriptor_subpath(&c.path)?;
        let catalog = self.graph.catalog();
        let relative = Path::new(subpath);

        if let Some(id) = self.descriptors.by_source(relative) {
            return Some(id.clone());
        }

        let (dir, file) = match subpath.split_once('/') {
            Some((dir, rest)) => (Some(dir), rest.rsplit('/').next().unwrap_or(rest)),
            None => (None, subpath),
        };
        let stem = file.strip_suffix(DESCRIPTOR_SUFFIX);

        for token in stem.into_iter().chain(dir) {
            if let Some(feature) = catalog.lookup(token) {
                return Some(feature.id.clone());
            }
        }

        if let Some(id) = dir.and_then(|dir| self.descriptors.by_dir(dir)) {
            return Some(id.clone());
        }

        stem.or(dir).map(str::to_string)
    }
}

//! Test buckets and the features they exercise.

pub mod snapshot;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::features::{FeatureCatalog, FeatureId};
use crate::graph::FeatureGraph;

pub use snapshot::{load_snapshot, parse_snapshot, Snapshot};

/// Bucket id: the FAT project name, e.g. `com.ibm.ws.jdbc_fat`.
pub type BucketId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestBucket {
    pub id: BucketId,
    /// Feature tokens as recorded: symbolic names or public short names
    pub features: BTreeSet<String>,
}

impl TestBucket {
    pub fn new<I, S>(id: impl Into<BucketId>, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            features: features.into_iter().map(Into::into).collect(),
        }
    }
}

/// Which buckets to run.
///
/// `All` is a distinct value rather than a set holding every known id, so
/// it stays correct when buckets are added later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BucketSelection {
    All,
    Only { buckets: BTreeSet<BucketId> },
}

impl BucketSelection {
    pub fn only<I, S>(buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<BucketId>,
    {
        Self::Only {
            buckets: buckets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn none() -> Self {
        Self::Only {
            buckets: BTreeSet::new(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn includes(&self, bucket: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only { buckets } => buckets.contains(bucket),
        }
    }

    /// The finite set, or `None` for `All`.
    pub fn buckets(&self) -> Option<&BTreeSet<BucketId>> {
        match self {
            Self::All => None,
            Self::Only { buckets } => Some(buckets),
        }
    }

    /// Add buckets to a finite selection. `All` absorbs them.
    pub fn extend<I, S>(&mut self, more: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<BucketId>,
    {
        if let Self::Only { buckets } = self {
            buckets.extend(more.into_iter().map(Into::into));
        }
    }

    pub fn union(mut self, other: BucketSelection) -> BucketSelection {
        match other {
            Self::All => Self::All,
            Self::Only { buckets } => {
                self.extend(buckets);
                self
            }
        }
    }
}

impl fmt::Display for BucketSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Only { buckets } => {
                let ids: Vec<&str> = buckets.iter().map(String::as_str).collect();
                f.write_str(&ids.join("\n"))
            }
        }
    }
}

/// Why a feature query could not be narrowed to a finite set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "feature", rename_all = "snake_case")]
pub enum FallbackReason {
    NoAffectedFeatures,
    UnknownFeature(FeatureId),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAffectedFeatures => f.write_str("no specific feature was identified as affected"),
            Self::UnknownFeature(id) => write!(f, "feature [ {} ] is not in the catalog", id),
        }
    }
}

/// Immutable bucket id -> exercised features map.
#[derive(Debug, Clone, Default)]
pub struct TestBucketIndex {
    buckets: BTreeMap<BucketId, TestBucket>,
}

impl TestBucketIndex {
    /// Later buckets with a repeated id merge their features into the first.
    pub fn new<I>(buckets: I) -> Self
    where
        I: IntoIterator<Item = TestBucket>,
    {
        let mut index: BTreeMap<BucketId, TestBucket> = BTreeMap::new();
        for bucket in buckets {
            match index.get_mut(&bucket.id) {
                Some(existing) => existing.features.extend(bucket.features),
                None => {
                    index.insert(bucket.id.clone(), bucket);
                }
            }
        }
        Self { buckets: index }
    }

    pub fn from_map(map: BTreeMap<BucketId, Vec<String>>) -> Self {
        Self::new(map.into_iter().map(|(id, features)| TestBucket::new(id, features)))
    }

    pub fn get(&self, id: &str) -> Option<&TestBucket> {
        self.buckets.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.buckets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestBucket> {
        self.buckets.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Buckets exercising any of `features`, or `All` when the query cannot
    /// be narrowed (empty input or a feature missing from the catalog).
    pub fn buckets_exercising(
        &self,
        graph: &FeatureGraph,
        features: &BTreeSet<FeatureId>,
    ) -> BucketSelection {
        match self.matching_buckets(graph, features) {
            Ok(buckets) => BucketSelection::Only { buckets },
            Err(reason) => {
                log::debug!("Selecting all buckets: {}", reason);
                BucketSelection::All
            }
        }
    }

    /// Finite form of [`Self::buckets_exercising`] that reports why it fell back.
    pub fn matching_buckets(
        &self,
        graph: &FeatureGraph,
        features: &BTreeSet<FeatureId>,
    ) -> Result<BTreeSet<BucketId>, FallbackReason> {
        if features.is_empty() {
            return Err(FallbackReason::NoAffectedFeatures);
        }
        let catalog = graph.catalog();
        if let Some(unknown) = features.iter().find(|id| !catalog.contains(id)) {
            return Err(FallbackReason::UnknownFeature(unknown.clone()));
        }

        let mut targets: BTreeSet<&str> = features.iter().map(String::as_str).collect();
        for feature in features {
            targets.extend(graph.tolerance_peers(feature));
        }

        let selected: BTreeSet<BucketId> = self
            .buckets
            .values()
            .filter(|bucket| {
                bucket
                    .features
                    .iter()
                    .any(|token| targets.contains(normalize_token(catalog, token)))
            })
            .map(|bucket| bucket.id.clone())
            .collect();

        log::debug!(
            "{} of {} buckets exercise {} affected features",
            selected.len(),
            self.buckets.len(),
            features.len()
        );
        Ok(selected)
    }

    /// Recorded features that the catalog does not know, as (bucket, token).
    pub fn stale_features<'a>(&'a self, catalog: &FeatureCatalog) -> Vec<(&'a str, &'a str)> {
        let mut stale = Vec::new();
        for bucket in self.buckets.values() {
            for token in &bucket.features {
                if catalog.lookup(token).is_none() {
                    stale.push((bucket.id.as_str(), token.as_str()));
                }
            }
        }
        stale
    }
}

/// Map a recorded token to the catalog's symbolic name when it resolves.
fn normalize_token<'a>(catalog: &'a FeatureCatalog, token: &'a str) -> &'a str {
    catalog
        .lookup(token)
        .map(|feature| feature.id.as_str())
        .unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureRecord, ToleranceGroup};

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn graph() -> FeatureGraph {
        FeatureGraph::new(
            FeatureCatalog::build(vec![
                FeatureRecord::public("com.ibm.websphere.appserver.jsonb-1.0", "jsonb-1.0"),
                FeatureRecord::public("com.ibm.websphere.appserver.jdbc-4.0", "jdbc-4.0"),
                FeatureRecord::public("com.ibm.websphere.appserver.jdbc-4.2", "jdbc-4.2"),
                FeatureRecord::new("batch-1.0").requires(ToleranceGroup::from_tolerates(
                    "com.ibm.websphere.appserver.jdbc-4.0",
                    ["4.2"],
                )),
            ])
            .unwrap(),
        )
    }

    fn index() -> TestBucketIndex {
        TestBucketIndex::new(vec![
            TestBucket::new("com.ibm.ws.jsonb_fat", ["jsonb-1.0"]),
            TestBucket::new("com.ibm.ws.jdbc_fat", ["JDBC-4.0"]),
            TestBucket::new("com.ibm.ws.idle_fat", Vec::<String>::new()),
        ])
    }

    #[test]
    fn test_empty_query_selects_all() {
        assert_eq!(index().buckets_exercising(&graph(), &set(&[])), BucketSelection::All);
    }

    #[test]
    fn test_unknown_feature_selects_all() {
        let result = index().matching_buckets(&graph(), &set(&["brandNew-1.0"]));
        assert_eq!(
            result,
            Err(FallbackReason::UnknownFeature("brandNew-1.0".into()))
        );
    }

    #[test]
    fn test_short_names_are_normalized() {
        let selection = index().buckets_exercising(
            &graph(),
            &set(&["com.ibm.websphere.appserver.jsonb-1.0"]),
        );
        assert_eq!(selection, BucketSelection::only(["com.ibm.ws.jsonb_fat"]));
    }

    #[test]
    fn test_tolerance_peers_match() {
        let selection = index().buckets_exercising(
            &graph(),
            &set(&["com.ibm.websphere.appserver.jdbc-4.2"]),
        );
        assert!(selection.includes("com.ibm.ws.jdbc_fat"));
        assert!(!selection.includes("com.ibm.ws.jsonb_fat"));
    }

    #[test]
    fn test_no_matching_bucket_is_empty_not_all() {
        let selection = index().buckets_exercising(&graph(), &set(&["batch-1.0"]));
        assert_eq!(selection, BucketSelection::none());
    }

    #[test]
    fn test_duplicate_bucket_ids_merge() {
        let index = TestBucketIndex::new(vec![
            TestBucket::new("a_fat", ["x"]),
            TestBucket::new("a_fat", ["y"]),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a_fat").unwrap().features, set(&["x", "y"]));
    }

    #[test]
    fn test_selection_union() {
        let a = BucketSelection::only(["a"]);
        assert_eq!(a.clone().union(BucketSelection::All), BucketSelection::All);
        assert_eq!(BucketSelection::All.union(a.clone()), BucketSelection::All);
        assert_eq!(
            a.union(BucketSelection::only(["b"])),
            BucketSelection::only(["a", "b"])
        );
    }

    #[test]
    fn test_selection_json_shape() {
        assert_eq!(
            serde_json::to_string(&BucketSelection::All).unwrap(),
            r#"{"mode":"all"}"#
        );
        assert_eq!(
            serde_json::to_string(&BucketSelection::only(["b", "a"])).unwrap(),
            r#"{"mode":"only","buckets":["a","b"]}"#
        );
    }

    #[test]
    fn test_stale_features() {
        let index = TestBucketIndex::new(vec![TestBucket::new("a_fat", ["jsonb-1.0", "gone-1.0"])]);
        let g = graph();
        assert_eq!(index.stale_features(g.catalog()), vec![("a_fat", "gone-1.0")]);
    }
}

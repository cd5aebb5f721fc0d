use std::collections::{BTreeSet, HashMap};

use crate::features::{BundleId, FeatureCatalog, FeatureId};

/// Reverse dependency indices over a feature catalog.
///
/// Edges point from a dependency to its dependents so impact can be
/// propagated outward from whatever changed. The graph owns the catalog it
/// was derived from and, like the catalog, is never mutated after
/// construction.
#[derive(Debug, Clone)]
pub struct FeatureGraph {
    catalog: FeatureCatalog,
    /// bundle -> features listing it in `-bundles`
    bundle_dependents: HashMap<BundleId, BTreeSet<FeatureId>>,
    /// feature -> features requiring it, directly or as a tolerated alternative
    required_by: HashMap<FeatureId, BTreeSet<FeatureId>>,
    /// feature -> auto-features whose activation condition references it
    activated_by: HashMap<FeatureId, BTreeSet<FeatureId>>,
    /// feature -> other members of any tolerance group it appears in
    tolerance_peers: HashMap<FeatureId, BTreeSet<FeatureId>>,
}

impl FeatureGraph {
    /// Derive all reverse indices from `catalog`.
    pub fn new(catalog: FeatureCatalog) -> Self {
        let mut bundle_dependents: HashMap<BundleId, BTreeSet<FeatureId>> = HashMap::new();
        let mut required_by: HashMap<FeatureId, BTreeSet<FeatureId>> = HashMap::new();
        let mut activated_by: HashMap<FeatureId, BTreeSet<FeatureId>> = HashMap::new();
        let mut tolerance_peers: HashMap<FeatureId, BTreeSet<FeatureId>> = HashMap::new();

        for feature in catalog.iter() {
            for bundle in &feature.bundles {
                bundle_dependents
                    .entry(bundle.clone())
                    .or_default()
                    .insert(feature.id.clone());
            }

            for group in &feature.requirements {
                for member in group.members().filter(|m| *m != feature.id) {
                    required_by
                        .entry(member.to_string())
                        .or_default()
                        .insert(feature.id.clone());
                }
                if group.len() > 1 {
                    for member in group.members() {
                        let peers = tolerance_peers.entry(member.to_string()).or_default();
                        peers.extend(
                            group
                                .members()
                                .filter(|other| other != &member)
                                .map(str::to_string),
                        );
                    }
                }
            }

            if let Some(condition) = &feature.activation {
                for referenced in condition.referenced_features() {
                    if referenced != feature.id {
                        activated_by
                            .entry(referenced)
                            .or_default()
                            .insert(feature.id.clone());
                    }
                }
            }
        }

        let graph = Self {
            catalog,
            bundle_dependents,
            required_by,
            activated_by,
            tolerance_peers,
        };
        log::debug!(
            "Built feature graph: {} features, {} bundles, {} dependency edges",
            graph.catalog.len(),
            graph.bundle_count(),
            graph.edge_count()
        );
        graph
    }

    pub fn catalog(&self) -> &FeatureCatalog {
        &self.catalog
    }

    /// True if at least one feature lists `bundle`.
    pub fn is_known_bundle(&self, bundle: &str) -> bool {
        self.bundle_dependents.contains_key(bundle)
    }

    pub fn features_requiring_bundle<'a>(&'a self, bundle: &str) -> impl Iterator<Item = &'a str> {
        iter_set(self.bundle_dependents.get(bundle))
    }

    /// Features that require `feature`, including through tolerated alternatives.
    pub fn required_by<'a>(&'a self, feature: &str) -> impl Iterator<Item = &'a str> {
        iter_set(self.required_by.get(feature))
    }

    /// Auto-features whose activation condition mentions `feature`.
    pub fn activation_dependents<'a>(&'a self, feature: &str) -> impl Iterator<Item = &'a str> {
        iter_set(self.activated_by.get(feature))
    }

    /// Union of [`Self::required_by`] and [`Self::activation_dependents`].
    pub fn dependents(&self, feature: &str) -> BTreeSet<&str> {
        self.required_by(feature)
            .chain(self.activation_dependents(feature))
            .collect()
    }

    /// Features interchangeable with `feature` in some tolerance group.
    pub fn tolerance_peers<'a>(&'a self, feature: &str) -> impl Iterator<Item = &'a str> {
        iter_set(self.tolerance_peers.get(feature))
    }

    pub fn bundle_count(&self) -> usize {
        self.bundle_dependents.len()
    }

    /// Number of requirement and activation edges.
    pub fn edge_count(&self) -> usize {
        let requires: usize = self.required_by.values().map(BTreeSet::len).sum();
        let activates: usize = self.activated_by.values().map(BTreeSet::len).sum();
        requires + activates
    }
}

fn iter_set(set: Option<&BTreeSet<String>>) -> impl Iterator<Item = &str> {
    set.into_iter().flatten().map(String::as_str)
}

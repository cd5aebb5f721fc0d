//! Transitive closure of affected features.
//!
//! Starting from changed bundles and changed features, impact spreads along
//! reverse requirement edges (tolerated alternatives included) and into
//! auto-features whose activation condition becomes fully satisfied by the
//! changed and already-affected features. The loop runs until no new
//! feature is added.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::features::{BundleId, FeatureId};
use crate::graph::FeatureGraph;

/// Why a feature ended up in the affected set (first cause found).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cause", content = "via", rename_all = "snake_case")]
pub enum ImpactCause {
    RequiresBundle(BundleId),
    RequiresFeature(FeatureId),
    Activated(FeatureId),
}

impl fmt::Display for ImpactCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiresBundle(b) => write!(f, "requires changed bundle {}", b),
            Self::RequiresFeature(id) => write!(f, "requires affected feature {}", id),
            Self::Activated(id) => write!(f, "auto-activated by {}", id),
        }
    }
}

/// Affected features with the cause that first pulled each one in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Impact {
    pub causes: BTreeMap<FeatureId, ImpactCause>,
}

impl Impact {
    pub fn features(&self) -> BTreeSet<FeatureId> {
        self.causes.keys().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.causes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.causes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }
}

/// Computes affected features over an immutable [`FeatureGraph`].
#[derive(Debug, Clone, Copy)]
pub struct ImpactResolver<'g> {
    graph: &'g FeatureGraph,
}

impl<'g> ImpactResolver<'g> {
    pub fn new(graph: &'g FeatureGraph) -> Self {
        Self { graph }
    }

    /// Set of features affected by the given changes.
    ///
    /// Changed feature ids that are not in the catalog are ignored here.
    pub fn resolve_features(
        &self,
        changed_bundles: &BTreeSet<BundleId>,
        changed_features: &BTreeSet<FeatureId>,
    ) -> BTreeSet<FeatureId> {
        self.resolve(changed_bundles, changed_features).features()
    }

    /// Like [`Self::resolve_features`] but keeps the cause of each feature.
    pub fn resolve(
        &self,
        changed_bundles: &BTreeSet<BundleId>,
        changed_features: &BTreeSet<FeatureId>,
    ) -> Impact {
        let catalog = self.graph.catalog();
        let changed: BTreeSet<&str> = changed_features
            .iter()
            .map(String::as_str)
            .filter(|id| catalog.contains(id))
            .collect();

        let mut closure = Closure {
            graph: self.graph,
            changed: &changed,
            causes: BTreeMap::new(),
            queue: VecDeque::new(),
        };

        for bundle in changed_bundles {
            for feature in self.graph.features_requiring_bundle(bundle) {
                closure.mark(feature, || ImpactCause::RequiresBundle(bundle.clone()));
            }
        }
        for feature in &changed {
            closure.propagate_from(feature);
        }
        while let Some(feature) = closure.queue.pop_front() {
            closure.propagate_from(feature);
        }

        log::debug!(
            "Resolved {} affected features from {} changed bundles and {} changed features",
            closure.causes.len(),
            changed_bundles.len(),
            changed.len()
        );

        Impact {
            causes: closure
                .causes
                .into_iter()
                .map(|(id, cause)| (id.to_string(), cause))
                .collect(),
        }
    }
}

struct Closure<'g, 'c> {
    graph: &'g FeatureGraph,
    changed: &'c BTreeSet<&'c str>,
    causes: BTreeMap<&'g str, ImpactCause>,
    queue: VecDeque<&'g str>,
}

impl<'g, 'c> Closure<'g, 'c> {
    fn mark<F>(&mut self, feature: &'g str, cause: F)
    where
        F: FnOnce() -> ImpactCause,
    {
        if !self.causes.contains_key(feature) {
            self.causes.insert(feature, cause());
            self.queue.push_back(feature);
        }
    }

    fn propagate_from(&mut self, source: &str) {
        let graph = self.graph;
        for dependent in graph.required_by(source) {
            self.mark(dependent, || ImpactCause::RequiresFeature(source.to_string()));
        }
        for auto in graph.activation_dependents(source) {
            if !self.causes.contains_key(auto) && self.activates(auto) {
                self.mark(auto, || ImpactCause::Activated(source.to_string()));
            }
        }
    }

    fn activates(&self, auto: &str) -> bool {
        let condition = match self
            .graph
            .catalog()
            .get(auto)
            .and_then(|f| f.activation.as_ref())
        {
            Some(condition) => condition,
            None => return false,
        };
        condition
            .evaluate(&|id: &str| self.causes.contains_key(id) || self.changed.contains(id))
            .activates()
    }
}

use std::collections::{BTreeSet, HashMap};

use crate::errors::{Error, IdentityKind, Result};

use super::model::{Feature, FeatureId, FeatureRecord, ToleranceGroup, Visibility};

/// Immutable set of known features, keyed by symbolic name and by public
/// short name.
///
/// Built once from descriptor records and never mutated afterwards, so a
/// shared reference can be read from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct FeatureCatalog {
    features: HashMap<FeatureId, Feature>,
    /// Lower-cased short name -> symbolic name
    short_names: HashMap<String, FeatureId>,
}

impl FeatureCatalog {
    /// Validate descriptor records and build the catalog.
    ///
    /// Fails with `MalformedDescriptor` when a record has no symbolic name and
    /// with `DuplicateIdentity` when a symbolic name or public short name repeats.
    /// Records are ordered by source before validation so the reported pair
    /// of a duplicate does not depend on loader ordering.
    pub fn build<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = FeatureRecord>,
    {
        let mut records: Vec<FeatureRecord> = records.into_iter().collect();
        records.sort_by(|a, b| {
            (&a.source, &a.symbolic_name).cmp(&(&b.source, &b.symbolic_name))
        });

        let mut catalog = Self::default();
        for record in records {
            catalog.insert(record)?;
        }

        let auto_count = catalog.features.values().filter(|f| f.is_auto()).count();
        log::info!(
            "Built feature catalog: {} features ({} public, {} auto)",
            catalog.features.len(),
            catalog.short_names.len(),
            auto_count
        );
        for (feature, group) in catalog.unresolved_requirements() {
            log::warn!(
                "Feature [ {} ] requires [ {} ] but no member of that group is in the catalog",
                feature,
                group
            );
        }

        Ok(catalog)
    }

    fn insert(&mut self, record: FeatureRecord) -> Result<()> {
        let id = match record.symbolic_name.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                return Err(Error::malformed(
                    record.source.clone(),
                    "missing symbolic name",
                ))
            }
        };

        if let Some(existing) = self.features.get(&id) {
            return Err(Error::DuplicateIdentity {
                kind: IdentityKind::SymbolicName,
                id,
                first: existing.source.clone(),
                second: record.source,
            });
        }

        let visibility = if record.activation.is_some() {
            Visibility::Auto
        } else {
            record.visibility
        };

        // Only public features own a short name; others may reuse one freely.
        let short_name = record
            .short_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && visibility == Visibility::Public);

        if let Some(ref short) = short_name {
            let key = short.to_ascii_lowercase();
            if let Some(owner) = self.short_names.get(&key) {
                return Err(Error::DuplicateIdentity {
                    kind: IdentityKind::ShortName,
                    id: short.clone(),
                    first: self.features.get(owner).and_then(|f| f.source.clone()),
                    second: record.source,
                });
            }
            self.short_names.insert(key, id.clone());
        }

        let bundles: BTreeSet<String> = record
            .bundles
            .into_iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();

        let mut requirements = record.features;
        requirements.sort();
        requirements.dedup();

        self.features.insert(
            id.clone(),
            Feature {
                id,
                short_name,
                visibility,
                kind: record.kind,
                bundles,
                requirements,
                activation: record.activation,
                source: record.source,
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.features.get(id)
    }

    /// Find a feature by public short name, ignoring case.
    pub fn by_short_name(&self, short_name: &str) -> Option<&Feature> {
        self.short_names
            .get(&short_name.trim().to_ascii_lowercase())
            .and_then(|id| self.features.get(id))
    }

    /// Resolve a token that may be a symbolic name or a short name.
    pub fn lookup(&self, token: &str) -> Option<&Feature> {
        self.get(token).or_else(|| self.by_short_name(token))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.features.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// All features in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    /// Symbolic names in sorted order.
    pub fn ids(&self) -> BTreeSet<&str> {
        self.features.keys().map(String::as_str).collect()
    }

    /// Requirement groups with no member present in the catalog, sorted by
    /// requiring feature.
    pub fn unresolved_requirements(&self) -> Vec<(&str, &ToleranceGroup)> {
        let mut unresolved = Vec::new();
        for feature in self.features.values() {
            for group in &feature.requirements {
                if !group.any_member(|m| self.contains(m)) {
                    unresolved.push((feature.id.as_str(), group));
                }
            }
        }
        unresolved.sort();
        unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::model::ActivationCondition;
    use std::path::PathBuf;

    #[test]
    fn test_build_indexes_short_names_case_insensitively() {
        let catalog = FeatureCatalog::build(vec![
            FeatureRecord::public("com.ibm.websphere.appserver.jsonb-1.0", "jsonb-1.0")
                .with_bundles(["com.ibm.ws.jsonb.service"]),
        ])
        .unwrap();

        assert_eq!(catalog.len(), 1);
        let feature = catalog.by_short_name("JSONB-1.0").unwrap();
        assert_eq!(feature.id, "com.ibm.websphere.appserver.jsonb-1.0");
        assert!(feature.requires_bundle("com.ibm.ws.jsonb.service"));
        assert!(catalog.lookup("jsonb-1.0").is_some());
        assert!(catalog
            .lookup("com.ibm.websphere.appserver.jsonb-1.0")
            .is_some());
        assert!(catalog.lookup("jsonp-1.0").is_none());
    }

    #[test]
    fn test_missing_symbolic_name_is_malformed() {
        let record = FeatureRecord {
            source: Some(PathBuf::from("visibility/private/broken.feature")),
            ..FeatureRecord::default()
        };
        let err = FeatureCatalog::build(vec![record]).unwrap_err();
        match err {
            Error::MalformedDescriptor { file, .. } => {
                assert_eq!(file, Some(PathBuf::from("visibility/private/broken.feature")))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_symbolic_name_is_malformed() {
        let err = FeatureCatalog::build(vec![FeatureRecord::new("   ")]).unwrap_err();
        assert!(matches!(err, Error::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_duplicate_symbolic_name() {
        let err = FeatureCatalog::build(vec![
            FeatureRecord::new("a").with_source("one.feature"),
            FeatureRecord::new("a").with_source("two.feature"),
        ])
        .unwrap_err();
        match err {
            Error::DuplicateIdentity {
                kind, first, second, ..
            } => {
                assert_eq!(kind, IdentityKind::SymbolicName);
                assert_eq!(first, Some(PathBuf::from("one.feature")));
                assert_eq!(second, Some(PathBuf::from("two.feature")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_short_name() {
        let err = FeatureCatalog::build(vec![
            FeatureRecord::public("a-1.0", "shared-1.0"),
            FeatureRecord::public("b-1.0", "Shared-1.0"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateIdentity {
                kind: IdentityKind::ShortName,
                ..
            }
        ));
    }

    #[test]
    fn test_private_feature_may_reuse_public_short_name() {
        let mut private = FeatureRecord::new("io.openliberty.jsonb.internal-1.0");
        private.short_name = Some("jsonb-1.0".into());
        let mut protected = FeatureRecord::new("io.openliberty.jsonb.spi-1.0");
        protected.short_name = Some("JSONB-1.0".into());
        protected.visibility = Visibility::Protected;

        let catalog = FeatureCatalog::build(vec![
            FeatureRecord::public("com.ibm.websphere.appserver.jsonb-1.0", "jsonb-1.0"),
            private,
            protected,
        ])
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.lookup("jsonb-1.0").unwrap().id,
            "com.ibm.websphere.appserver.jsonb-1.0"
        );
        assert!(catalog
            .get("io.openliberty.jsonb.internal-1.0")
            .unwrap()
            .short_name
            .is_none());
    }

    #[test]
    fn test_private_short_name_is_not_indexed() {
        let mut private = FeatureRecord::new("io.openliberty.private-validator-1.0");
        private.short_name = Some("validator-1.0".into());
        let catalog = FeatureCatalog::build(vec![private]).unwrap();
        assert!(catalog.by_short_name("validator-1.0").is_none());
        assert!(catalog.lookup("io.openliberty.private-validator-1.0").is_some());
    }

    #[test]
    fn test_activation_forces_auto_visibility() {
        let mut record = FeatureRecord::new("auto-x");
        record.activation = Some(ActivationCondition::feature("y"));
        record.visibility = Visibility::Private;
        let catalog = FeatureCatalog::build(vec![record]).unwrap();
        let feature = catalog.get("auto-x").unwrap();
        assert!(feature.is_auto());
        assert_eq!(feature.visibility, Visibility::Auto);
    }

    #[test]
    fn test_unresolved_requirements_respect_tolerates() {
        let catalog = FeatureCatalog::build(vec![
            FeatureRecord::new("servlet-3.1"),
            FeatureRecord::new("app")
                .requires(ToleranceGroup::from_tolerates("servlet-3.0", ["3.1"]))
                .requires_feature("missing-1.0"),
        ])
        .unwrap();
        let unresolved = catalog.unresolved_requirements();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].0, "app");
        assert_eq!(unresolved[0].1.primary(), "missing-1.0");
    }

    #[test]
    fn test_requirements_are_deduplicated() {
        let catalog = FeatureCatalog::build(vec![FeatureRecord::new("a")
            .requires_feature("b")
            .requires_feature("b")
            .with_bundles(["x", "x", " "])])
        .unwrap();
        let feature = catalog.get("a").unwrap();
        assert_eq!(feature.requirements.len(), 1);
        assert_eq!(feature.bundles.len(), 1);
    }
}

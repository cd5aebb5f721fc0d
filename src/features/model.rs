//! Feature model: identities, tolerance groups and activation conditions.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Symbolic feature name, e.g. `com.ibm.websphere.appserver.jdbc-4.2`.
pub type FeatureId = String;

/// Bundle symbolic name, e.g. `com.ibm.ws.jdbc.4.2`.
pub type BundleId = String;

/// Declared visibility of a feature descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    Private,
    Auto,
}

impl Visibility {
    /// Parse a visibility value, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "protected" => Some(Self::Protected),
            "private" => Some(Self::Private),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A required feature plus the versions tolerated in its place.
///
/// For impact purposes every member of the group is interchangeable: a
/// change to any member affects whoever requires the group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ToleranceGroup {
    primary: FeatureId,
    alternatives: BTreeSet<FeatureId>,
}

impl ToleranceGroup {
    /// A group with no tolerated alternatives.
    pub fn single(primary: impl Into<FeatureId>) -> Self {
        Self {
            primary: primary.into(),
            alternatives: BTreeSet::new(),
        }
    }

    pub fn with_alternatives<I, S>(primary: impl Into<FeatureId>, alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FeatureId>,
    {
        let primary = primary.into();
        let alternatives = alternatives
            .into_iter()
            .map(Into::into)
            .filter(|alt: &FeatureId| *alt != primary)
            .collect();
        Self {
            primary,
            alternatives,
        }
    }

    /// Build a group from an `ibm.tolerates` version list.
    ///
    /// Each tolerated version replaces the text after the last `-` of the
    /// primary id: `jdbc-4.0` tolerating `4.1` yields `jdbc-4.1`. A primary
    /// without a version suffix gets `<primary>-<version>`.
    pub fn from_tolerates<I, S>(primary: impl Into<FeatureId>, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let primary = primary.into();
        let base = match primary.rfind('-') {
            Some(idx) => &primary[..idx],
            None => primary.as_str(),
        };
        let alternatives: Vec<FeatureId> = versions
            .into_iter()
            .map(|v| v.as_ref().trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}-{}", base, v))
            .collect();
        Self::with_alternatives(primary, alternatives)
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        self.alternatives.iter().map(String::as_str)
    }

    /// Primary first, then alternatives in sorted order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.alternatives())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.primary == id || self.alternatives.contains(id)
    }

    /// Member count; never zero since the primary is always present.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        1 + self.alternatives.len()
    }

    /// True if any member satisfies `present`.
    pub fn any_member<F>(&self, present: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        self.members().any(present)
    }
}

impl fmt::Display for ToleranceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.primary)?;
        if !self.alternatives.is_empty() {
            let alts: Vec<&str> = self.alternatives().collect();
            write!(f, " (tolerates {})", alts.join(", "))?;
        }
        Ok(())
    }
}

/// Outcome of evaluating an activation condition against a change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Satisfaction {
    /// Every AND-ed clause has a satisfied disjunct.
    pub satisfied: bool,
    /// At least one satisfying feature came from the change set rather than
    /// from a vacuous (non-constraining) clause.
    pub changed_contributor: bool,
}

impl Satisfaction {
    /// Satisfied with at least one genuinely changed contributor.
    pub fn activates(&self) -> bool {
        self.satisfied && self.changed_contributor
    }

    fn vacuous() -> Self {
        Self {
            satisfied: true,
            changed_contributor: false,
        }
    }
}

/// Auto-feature activation formula.
///
/// Conjunctive of disjunctive in practice (`All` of `Any` of `Feature`),
/// though evaluation handles arbitrary nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationCondition {
    All(Vec<ActivationCondition>),
    Any(Vec<ActivationCondition>),
    Feature(ToleranceGroup),
}

impl ActivationCondition {
    /// Shorthand for a leaf on a single feature id.
    pub fn feature(id: impl Into<FeatureId>) -> Self {
        Self::Feature(ToleranceGroup::single(id))
    }

    /// A clause satisfied by any of the given ids.
    pub fn any_of<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FeatureId>,
    {
        Self::Any(ids.into_iter().map(|id| Self::feature(id)).collect())
    }

    /// Every feature id the condition mentions, tolerated alternatives included.
    pub fn referenced_features(&self) -> BTreeSet<FeatureId> {
        let mut out = BTreeSet::new();
        self.collect_features(&mut out);
        out
    }

    fn collect_features(&self, out: &mut BTreeSet<FeatureId>) {
        match self {
            Self::All(children) | Self::Any(children) => {
                children.iter().for_each(|c| c.collect_features(out))
            }
            Self::Feature(group) => out.extend(group.members().map(str::to_string)),
        }
    }

    /// Evaluate against a membership predicate over changed/affected ids.
    ///
    /// An empty `All` or `Any` is non-constraining: satisfied, but it never
    /// counts as a changed contributor.
    pub fn evaluate<F>(&self, changed: &F) -> Satisfaction
    where
        F: Fn(&str) -> bool,
    {
        match self {
            Self::Feature(group) => {
                let hit = group.any_member(changed);
                Satisfaction {
                    satisfied: hit,
                    changed_contributor: hit,
                }
            }
            Self::All(children) => {
                children
                    .iter()
                    .fold(Satisfaction::vacuous(), |acc, child| {
                        let s = child.evaluate(changed);
                        Satisfaction {
                            satisfied: acc.satisfied && s.satisfied,
                            changed_contributor: acc.changed_contributor || s.changed_contributor,
                        }
                    })
            }
            Self::Any(children) if children.is_empty() => Satisfaction::vacuous(),
            Self::Any(children) => children
                .iter()
                .map(|child| child.evaluate(changed))
                .filter(|s| s.satisfied)
                .fold(Satisfaction::default(), |acc, s| Satisfaction {
                    satisfied: true,
                    changed_contributor: acc.changed_contributor || s.changed_contributor,
                }),
        }
    }
}

/// A feature descriptor as handed over by a loader, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    pub symbolic_name: Option<FeatureId>,
    pub short_name: Option<String>,
    pub visibility: Visibility,
    pub kind: Option<String>,
    pub bundles: Vec<BundleId>,
    pub features: Vec<ToleranceGroup>,
    pub activation: Option<ActivationCondition>,
    pub source: Option<PathBuf>,
}

impl FeatureRecord {
    pub fn new(symbolic_name: impl Into<FeatureId>) -> Self {
        Self {
            symbolic_name: Some(symbolic_name.into()),
            ..Self::default()
        }
    }

    pub fn public(symbolic_name: impl Into<FeatureId>, short_name: impl Into<String>) -> Self {
        Self {
            short_name: Some(short_name.into()),
            visibility: Visibility::Public,
            ..Self::new(symbolic_name)
        }
    }

    pub fn with_bundles<I, S>(mut self, bundles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<BundleId>,
    {
        self.bundles.extend(bundles.into_iter().map(Into::into));
        self
    }

    pub fn requires(mut self, group: ToleranceGroup) -> Self {
        self.features.push(group);
        self
    }

    pub fn requires_feature(self, id: impl Into<FeatureId>) -> Self {
        self.requires(ToleranceGroup::single(id))
    }

    pub fn with_activation(mut self, condition: ActivationCondition) -> Self {
        self.activation = Some(condition);
        self.visibility = Visibility::Auto;
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A validated catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    pub id: FeatureId,
    pub short_name: Option<String>,
    pub visibility: Visibility,
    pub kind: Option<String>,
    pub bundles: BTreeSet<BundleId>,
    pub requirements: Vec<ToleranceGroup>,
    pub activation: Option<ActivationCondition>,
    pub source: Option<PathBuf>,
}

impl Feature {
    pub fn is_auto(&self) -> bool {
        self.activation.is_some()
    }

    pub fn requires_bundle(&self, bundle: &str) -> bool {
        self.bundles.contains(bundle)
    }

    /// Every feature id this feature requires, alternatives included.
    pub fn required_features(&self) -> impl Iterator<Item = &str> {
        self.requirements.iter().flat_map(ToleranceGroup::members)
    }
}

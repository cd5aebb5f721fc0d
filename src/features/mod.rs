//! Feature model, descriptor parsing and the feature catalog.

pub mod catalog;
pub mod descriptor;
pub mod filter;
pub mod loader;
pub mod model;

pub use catalog::FeatureCatalog;
pub use descriptor::parse_descriptor;
pub use loader::{load_catalog, load_descriptors};
pub use model::{
    ActivationCondition, BundleId, Feature, FeatureId, FeatureRecord, Satisfaction,
    ToleranceGroup, Visibility,
};

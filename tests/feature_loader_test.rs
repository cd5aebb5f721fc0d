mod common;

use common::{FixtureRepo, BATCH, JDBC_40, JDBC_42, VALIDATOR, VALIDATOR_JDBC};
use fatscope::errors::IdentityKind;
use fatscope::{load_catalog, Error, FeatureGraph, Visibility};
use pretty_assertions::assert_eq;

#[test]
fn test_fixture_tree_loads() {
    let repo = FixtureRepo::new();
    let catalog = load_catalog(&repo.feature_root()).unwrap();

    assert_eq!(catalog.len(), 6);
    assert_eq!(catalog.lookup("JDBC-4.2").unwrap().id, JDBC_42);
    assert_eq!(catalog.get(VALIDATOR).unwrap().visibility, Visibility::Private);

    let auto = catalog.get(VALIDATOR_JDBC).unwrap();
    assert!(auto.is_auto());
    assert_eq!(
        auto.activation.as_ref().unwrap().referenced_features(),
        common::set(&[JDBC_40, JDBC_42, VALIDATOR])
    );

    let batch = catalog.get(BATCH).unwrap();
    assert_eq!(batch.requirements.len(), 1);
    assert!(batch.requirements[0].contains("com.ibm.websphere.appserver.jdbc-4.3"));
}

#[test]
fn test_fixture_graph_edges() {
    let repo = FixtureRepo::new();
    let graph = FeatureGraph::new(load_catalog(&repo.feature_root()).unwrap());

    assert!(graph.is_known_bundle("com.ibm.ws.jdbc.4.2"));
    assert!(!graph.is_known_bundle("com.ibm.ws.orphan"));
    let dependents = graph.dependents(JDBC_42);
    assert!(dependents.contains(BATCH));
    assert!(dependents.contains(VALIDATOR_JDBC));
}

#[test]
fn test_duplicate_short_name_names_both_files() {
    let repo = FixtureRepo::new();
    repo.write(
        &FixtureRepo::descriptor("public/jsonb-1.0/io.openliberty.jsonb-1.0.feature"),
        "symbolicName=io.openliberty.jsonb-1.0\nvisibility=public\nIBM-ShortName: jsonb-1.0\n",
    );

    match load_catalog(&repo.feature_root()).unwrap_err() {
        Error::DuplicateIdentity {
            kind,
            id,
            first,
            second,
        } => {
            assert_eq!(kind, IdentityKind::ShortName);
            assert_eq!(id, "jsonb-1.0");
            assert!(first.is_some() && second.is_some());
            assert_ne!(first, second);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_descriptor_without_symbolic_name_is_malformed() {
    let repo = FixtureRepo::new();
    let path = repo.write(
        &FixtureRepo::descriptor("public/broken/broken.feature"),
        "visibility=public\nIBM-ShortName: broken-1.0\n",
    );

    let err = load_catalog(&repo.feature_root()).unwrap_err();
    assert!(matches!(err, Error::MalformedDescriptor { .. }));
    assert!(err.to_string().contains(&path.display().to_string()));
}

#[test]
fn test_missing_feature_root_is_config_error() {
    let repo = FixtureRepo::new();
    let err = load_catalog(&repo.path().join("no/such/dir")).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

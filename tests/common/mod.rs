// Test utility module for fatscope integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use fatscope::{
    ActivationCondition, FeatureCatalog, FeatureGraph, FeatureRecord, ToleranceGroup,
};
use tempfile::TempDir;

pub const FEATURE_ROOT: &str = "dev/com.ibm.websphere.appserver.features/visibility";
pub const SNAPSHOT: &str = "dev/fattest.simplicity/fat-features.json";

pub const JSONB: &str = "com.ibm.websphere.appserver.jsonb-1.0";
pub const JDBC_40: &str = "com.ibm.websphere.appserver.jdbc-4.0";
pub const JDBC_42: &str = "com.ibm.websphere.appserver.jdbc-4.2";
pub const BATCH: &str = "com.ibm.websphere.appserver.batchManagement-1.0";
pub const VALIDATOR: &str = "io.openliberty.private-validator-1.0";
pub const VALIDATOR_JDBC: &str = "io.openliberty.validatorJdbc-1.0";

const DESCRIPTORS: &[(&str, &str)] = &[
    (
        "public/jsonb-1.0/com.ibm.websphere.appserver.jsonb-1.0.feature",
        "symbolicName=com.ibm.websphere.appserver.jsonb-1.0\n\
         visibility=public\n\
         IBM-ShortName: jsonb-1.0\n\
         -bundles=com.ibm.ws.jsonb.service\n",
    ),
    (
        "public/jdbc-4.0/com.ibm.websphere.appserver.jdbc-4.0.feature",
        "symbolicName=com.ibm.websphere.appserver.jdbc-4.0\n\
         visibility=public\n\
         IBM-ShortName: jdbc-4.0\n\
         -bundles=com.ibm.ws.jdbc\n",
    ),
    (
        "public/jdbc-4.2/com.ibm.websphere.appserver.jdbc-4.2.feature",
        "symbolicName=com.ibm.websphere.appserver.jdbc-4.2\n\
         visibility=public\n\
         IBM-ShortName: jdbc-4.2\n\
         -bundles=com.ibm.ws.jdbc, com.ibm.ws.jdbc.4.2\n",
    ),
    (
        "public/batchManagement-1.0/com.ibm.websphere.appserver.batchManagement-1.0.feature",
        "symbolicName=com.ibm.websphere.appserver.batchManagement-1.0\n\
         visibility=public\n\
         IBM-ShortName: batchManagement-1.0\n\
         -features=com.ibm.websphere.appserver.jdbc-4.0; ibm.tolerates:=\"4.1,4.2,4.3\"\n\
         -bundles=com.ibm.ws.jbatch.rest\n",
    ),
    (
        "private/validator-1.0/io.openliberty.private-validator-1.0.feature",
        "symbolicName=io.openliberty.private-validator-1.0\n\
         visibility=private\n\
         -bundles=com.ibm.ws.validator\n",
    ),
    (
        "auto/validatorJdbc-1.0/io.openliberty.validatorJdbc-1.0.feature",
        "symbolicName=io.openliberty.validatorJdbc-1.0\n\
         IBM-Provision-Capability: \\\n  \
         osgi.identity; filter:=\"(&(type=osgi.subsystem.feature)(osgi.identity=io.openliberty.private-validator-1.0))\", \\\n  \
         osgi.identity; filter:=\"(&(type=osgi.subsystem.feature)(|(osgi.identity=com.ibm.websphere.appserver.jdbc-4.0)(osgi.identity=com.ibm.websphere.appserver.jdbc-4.2)))\"\n\
         -bundles=com.ibm.ws.validator.jdbc\n",
    ),
];

const BUCKETS: &str = r#"{
  "generated": "2024-05-01T00:00:00Z",
  "buckets": {
    "com.ibm.ws.jsonb_fat": ["jsonb-1.0"],
    "com.ibm.ws.jdbc_fat": ["jdbc-4.2"],
    "com.ibm.ws.jdbc_fat_v40": ["com.ibm.websphere.appserver.jdbc-4.0"],
    "com.ibm.ws.jbatch_fat": ["batchManagement-1.0"],
    "com.ibm.ws.validator_fat": ["io.openliberty.validatorJdbc-1.0"],
    "com.ibm.ws.idle_fat": []
  }
}
"#;

/// A repository on disk with a descriptor tree and a bucket snapshot laid
/// out at the default locations.
pub struct FixtureRepo {
    pub dir: TempDir,
}

impl FixtureRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Self { dir };
        for (rel, body) in DESCRIPTORS {
            repo.write(&format!("{}/{}", FEATURE_ROOT, rel), body);
        }
        repo.write(SNAPSHOT, BUCKETS);
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn feature_root(&self) -> PathBuf {
        self.path().join(FEATURE_ROOT)
    }

    pub fn write(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.path().join(rel);
        fs::create_dir_all(path.parent().expect("relative path has a parent"))
            .expect("Failed to create fixture dirs");
        fs::write(&path, body).expect("Failed to write fixture file");
        path
    }

    /// Repository-relative path of a descriptor in the fixture.
    pub fn descriptor(vis_and_name: &str) -> String {
        format!("{}/{}", FEATURE_ROOT, vis_and_name)
    }
}

impl Default for FixtureRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory catalog with the same shape as the on-disk fixture.
pub fn catalog() -> FeatureCatalog {
    FeatureCatalog::build(vec![
        FeatureRecord::public(JSONB, "jsonb-1.0").with_bundles(["com.ibm.ws.jsonb.service"]),
        FeatureRecord::public(JDBC_40, "jdbc-4.0").with_bundles(["com.ibm.ws.jdbc"]),
        FeatureRecord::public(JDBC_42, "jdbc-4.2")
            .with_bundles(["com.ibm.ws.jdbc", "com.ibm.ws.jdbc.4.2"]),
        FeatureRecord::public(BATCH, "batchManagement-1.0")
            .requires(ToleranceGroup::from_tolerates(JDBC_40, ["4.1", "4.2", "4.3"]))
            .with_bundles(["com.ibm.ws.jbatch.rest"]),
        FeatureRecord::new(VALIDATOR).with_bundles(["com.ibm.ws.validator"]),
        FeatureRecord::new(VALIDATOR_JDBC)
            .with_activation(ActivationCondition::All(vec![
                ActivationCondition::feature(VALIDATOR),
                ActivationCondition::any_of([JDBC_40, JDBC_42]),
            ]))
            .with_bundles(["com.ibm.ws.validator.jdbc"]),
    ])
    .expect("fixture catalog is valid")
}

pub fn graph() -> FeatureGraph {
    FeatureGraph::new(catalog())
}

pub fn set(items: &[&str]) -> std::collections::BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

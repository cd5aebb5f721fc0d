//! Loader for the bucket -> features snapshot.
//!
//! Accepted shapes:
//!
//! ```json
//! { "generated": "2024-05-01", "buckets": { "com.ibm.ws.jdbc_fat": ["jdbc-4.2"] } }
//! { "com.ibm.ws.jdbc_fat": ["jdbc-4.2"] }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{BucketId, TestBucketIndex};
use crate::errors::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub generated: Option<String>,
    pub buckets: BTreeMap<BucketId, Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Wrapped {
        #[serde(default)]
        generated: Option<String>,
        buckets: BTreeMap<BucketId, Vec<String>>,
    },
    Bare(BTreeMap<BucketId, Vec<String>>),
}

pub fn parse_snapshot(text: &str) -> serde_json::Result<Snapshot> {
    let snapshot = match serde_json::from_str::<SnapshotFile>(text)? {
        SnapshotFile::Wrapped { generated, buckets } => Snapshot { generated, buckets },
        SnapshotFile::Bare(buckets) => Snapshot {
            generated: None,
            buckets,
        },
    };
    Ok(snapshot)
}

/// Read a snapshot file and build the bucket index from it.
pub fn load_snapshot(path: &Path) -> Result<TestBucketIndex> {
    let snapshot_error = |message: String| Error::Snapshot {
        path: path.to_path_buf(),
        message,
    };

    let text = fs::read_to_string(path).map_err(|e| snapshot_error(e.to_string()))?;
    let snapshot = parse_snapshot(&text).map_err(|e| snapshot_error(e.to_string()))?;

    match &snapshot.generated {
        Some(generated) => log::info!(
            "Loaded {} test buckets from {} (generated {})",
            snapshot.buckets.len(),
            path.display(),
            generated
        ),
        None => log::info!(
            "Loaded {} test buckets from {}",
            snapshot.buckets.len(),
            path.display()
        ),
    }

    Ok(TestBucketIndex::from_map(snapshot.buckets))
}

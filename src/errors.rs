//! Shared error types for fatscope.
//!
//! Catalog construction errors and unknown bundles are terminal for a run:
//! there is no partial or best-effort selection mode, so every variant that
//! can surface from [`crate::detector::ChangeDetector`] names the offending
//! path or identifier.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which identity collided while building a feature catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    SymbolicName,
    ShortName,
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKind::SymbolicName => write!(f, "symbolic name"),
            IdentityKind::ShortName => write!(f, "short name"),
        }
    }
}

/// Main error type for fatscope operations
#[derive(Debug, Error)]
pub enum Error {
    /// A feature descriptor is missing required data or cannot be parsed
    #[error("Malformed feature descriptor {}: {reason}", display_file(.file))]
    MalformedDescriptor {
        file: Option<PathBuf>,
        reason: String,
    },

    /// Two descriptors claim the same symbolic name or public short name
    #[error(
        "Duplicate feature {kind} [ {id} ] declared by {} and {}",
        display_file(.first),
        display_file(.second)
    )]
    DuplicateIdentity {
        kind: IdentityKind,
        id: String,
        first: Option<PathBuf>,
        second: Option<PathBuf>,
    },

    /// A changed product file belongs to a project that no feature requires
    #[error("Changed file [ {path} ] belongs to project [ {project} ] which is not a known bundle")]
    UnknownBundle { path: String, project: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Test bucket snapshot could not be read
    #[error("Invalid test bucket snapshot {}: {message}", .path.display())]
    Snapshot { path: PathBuf, message: String },

    /// Git errors
    #[error(transparent)]
    Git(#[from] git2::Error),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML errors
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Glob pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Regex errors
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

fn display_file(file: &Option<PathBuf>) -> String {
    file
        .as_ref()
        .map(|p| format!("[ {} ]", p.display()))
        .unwrap_or_else(|| "[ <in-memory record> ]".to_string())
}

impl Error {
    /// Create a malformed-descriptor error for a record with a known source file
    pub fn malformed(file: Option<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            file,
            reason: reason.into(),
        }
    }

    /// Create an unknown-bundle error
    pub fn unknown_bundle(path: impl Into<String>, project: impl Into<String>) -> Self {
        Self::UnknownBundle {
            path: path.into(),
            project: project.into(),
        }
    }

    /// True for errors raised while building the feature catalog
    pub fn is_catalog_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedDescriptor { .. } | Self::DuplicateIdentity { .. }
        )
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_bundle_message_names_path_and_project() {
        let err = Error::unknown_bundle("dev/com.example.gone/src/A.java", "com.example.gone");
        let msg = err.to_string();
        assert!(msg.contains("dev/com.example.gone/src/A.java"));
        assert!(msg.contains("com.example.gone"));
        assert!(!err.is_catalog_error());
    }

    #[test]
    fn test_duplicate_identity_message() {
        let err = Error::DuplicateIdentity {
            kind: IdentityKind::ShortName,
            id: "jsonb-1.0".into(),
            first: Some(PathBuf::from("a.feature")),
            second: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("short name"));
        assert!(msg.contains("jsonb-1.0"));
        assert!(msg.contains("a.feature"));
        assert!(msg.contains("<in-memory record>"));
        assert!(err.is_catalog_error());
    }

    #[test]
    fn test_malformed_without_file() {
        let err = Error::malformed(None, "missing symbolic name");
        assert_eq!(
            err.to_string(),
            "Malformed feature descriptor [ <in-memory record> ]: missing symbolic name"
        );
    }
}

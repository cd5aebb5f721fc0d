//! `.fatscope.toml` configuration model and loader.

mod core;
mod loader;

pub use self::core::{
    BundlesConfig, ClassificationConfig, FatscopeConfig, LayoutConfig, SelectionConfig,
};

pub use self::loader::{
    directory_ancestors, load_config, load_config_from_path, parse_config, CONFIG_FILE_NAME,
};

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, FatscopeConfig::default());
        assert_eq!(config.layout.project_roots, vec!["dev"]);
        assert!(config.selection.always_include.is_empty());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = parse_config(indoc! {r#"
            [classification]
            test_dirs = ["test"]

            [bundles.aliases]
            "com.ibm.ws.jdbc" = ["com.ibm.ws.jdbc", "com.ibm.ws.jdbc.4.1"]

            [selection]
            always_include = ["com.ibm.ws.java11_fat"]
        "#})
        .unwrap();

        assert_eq!(config.classification.test_dirs, vec!["test"]);
        assert_eq!(
            config.classification.fat_project_pattern,
            ClassificationConfig::default().fat_project_pattern
        );
        assert_eq!(config.bundles.aliases["com.ibm.ws.jdbc"].len(), 2);
        assert_eq!(config.selection.always_include, vec!["com.ibm.ws.java11_fat"]);
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(parse_config("[layout\nproject_roots = 3").is_err());
    }

    #[test]
    fn test_load_config_searches_ancestors() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[layout]\nsnapshot = \"buckets.json\"\n",
        )
        .unwrap();
        let nested = temp.path().join("dev").join("some.project");
        fs::create_dir_all(&nested).unwrap();

        let config = load_config(&nested).unwrap();
        assert_eq!(config.layout.snapshot, "buckets.json");
    }

    #[test]
    fn test_invalid_discovered_config_is_error() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[classification]\ninfra_projects = [\"com.ibm.ws.shared_fat\"\n",
        )
        .unwrap();
        let nested = temp.path().join("dev").join("com.ibm.ws.jdbc");
        fs::create_dir_all(&nested).unwrap();

        let err = load_config(&nested).unwrap_err();
        assert!(matches!(err, crate::errors::Error::Config(_)));
        assert!(err.to_string().contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_load_config_from_missing_path_is_error() {
        let temp = TempDir::new().unwrap();
        let err = load_config_from_path(&temp.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_directory_ancestors_is_bounded() {
        let start = std::path::PathBuf::from("/a/b/c/d");
        let dirs: Vec<_> = directory_ancestors(start, 2).collect();
        assert_eq!(dirs.len(), 2);
        assert_eq!(dirs[1], std::path::PathBuf::from("/a/b/c"));
    }
}

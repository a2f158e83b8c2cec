//! Configuration system tests
//!
//! Tests for config paths and workspace config loading/saving.

use gridlink::config::WorkspaceConfig;
use gridlink::config_paths;

// ========================================================================
// Config Paths Tests
// ========================================================================

#[test]
fn test_config_dir_contains_app_name() {
    if let Some(dir) = config_paths::config_dir() {
        assert!(dir.to_string_lossy().contains("gridlink"));
    }
}

#[test]
fn test_config_file_ends_with_yaml() {
    if let Some(path) = config_paths::config_file() {
        assert!(path.to_string_lossy().ends_with("config.yaml"));
    }
}

#[test]
fn test_logs_dir_is_subdir_of_config() {
    if let (Some(config), Some(logs)) = (config_paths::config_dir(), config_paths::logs_dir()) {
        assert!(logs.starts_with(&config));
    }
}

#[test]
fn test_workspace_config_file_lives_in_root() {
    let root = std::path::Path::new("/data/project");
    assert_eq!(
        config_paths::workspace_config_file(root),
        root.join(".gridlink.yaml")
    );
}

// ========================================================================
// Workspace Config Tests
// ========================================================================

#[test]
fn test_default_config() {
    let config = WorkspaceConfig::default();
    assert_eq!(config.relations_file, "relations.json");
    assert_eq!(config.layout_file, "relation_layout.json");
    assert_eq!(config.default_header_row, 0);
    assert_eq!(config.history_limit, None);
}

#[test]
fn test_partial_yaml_uses_defaults() {
    let config: WorkspaceConfig = serde_yaml::from_str("history_limit: 50\n").unwrap();
    assert_eq!(config.history_limit, Some(50));
    assert_eq!(config.relations_file, "relations.json");
}

#[test]
fn test_config_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.yaml");
    let config = WorkspaceConfig {
        default_header_row: 2,
        history_limit: Some(10),
        ..WorkspaceConfig::default()
    };

    config.save_to(&path).unwrap();
    assert_eq!(WorkspaceConfig::load_from(&path).unwrap(), config);
}

#[test]
fn test_invalid_yaml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "history_limit: [not, a, number]\n").unwrap();

    let err = WorkspaceConfig::load_from(&path).unwrap_err();
    assert!(err.contains("Failed to parse config"));
}

#[test]
fn test_workspace_local_config_wins() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        config_paths::workspace_config_file(dir.path()),
        "relations_file: links.json\n",
    )
    .unwrap();

    let config = WorkspaceConfig::for_workspace(dir.path());
    assert_eq!(config.relations_file, "links.json");
    assert_eq!(config.layout_file, "relation_layout.json");
}

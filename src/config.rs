//! Workspace configuration persistence
//!
//! Read from `<root>/.gridlink.yaml` when present, otherwise from
//! `~/.config/gridlink/config.yaml`. Every field has a default, so a partial
//! file is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Settings that shape how a workspace is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Relations file, relative to the workspace root
    pub relations_file: String,
    /// Layout file, relative to the workspace root
    pub layout_file: String,
    /// Header row index given to newly registered tables
    pub default_header_row: usize,
    /// Undo depth per document; `None` keeps everything
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_limit: Option<usize>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            relations_file: "relations.json".to_string(),
            layout_file: "relation_layout.json".to_string(),
            default_header_row: 0,
            history_limit: None,
        }
    }
}

impl WorkspaceConfig {
    /// Load the user config, or return defaults if missing or invalid
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        Self::load_from(&path).unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Self::default()
        })
    }

    /// Workspace-local config if `<root>/.gridlink.yaml` exists, the user config otherwise
    pub fn for_workspace(root: &Path) -> Self {
        let local = crate::config_paths::workspace_config_file(root);
        if !local.exists() {
            return Self::load();
        }
        Self::load_from(&local).unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Self::default()
        })
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
        let config = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse config at {}: {}", path.display(), e))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save to the user config file
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }
}

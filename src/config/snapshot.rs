use crate::domain::model::CartSnapshot;
use crate::utils::error::{CartError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Server-rendered cart state stored as JSON or TOML, chosen by file extension.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_toml(&self) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false)
    }

    pub fn load(&self) -> Result<CartSnapshot> {
        let content = fs::read_to_string(&self.path)?;
        tracing::debug!("📂 Loaded cart snapshot from {}", self.path.display());

        if self.is_toml() {
            toml::from_str(&content).map_err(|e| CartError::ConfigValidationError {
                field: "snapshot".to_string(),
                message: format!("TOML parsing error: {}", e),
            })
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    pub fn save(&self, snapshot: &CartSnapshot) -> Result<()> {
        let content = if self.is_toml() {
            toml::to_string_pretty(snapshot).map_err(|e| CartError::ConfigError {
                message: format!("Cannot serialize snapshot: {}", e),
            })?
        } else {
            serde_json::to_string_pretty(snapshot)?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, content)?;
        tracing::debug!("💾 Saved cart snapshot to {}", self.path.display());
        Ok(())
    }
}

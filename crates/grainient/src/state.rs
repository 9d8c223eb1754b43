use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Values remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    /// Last theme selected in the window.
    pub theme: Option<String>,
}

impl AppState {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read state file at {}", path.display()))?;
            let state: Self = toml::from_str(&contents)
                .with_context(|| format!("failed to parse state file at {}", path.display()))?;
            Ok(state)
        } else {
            Ok(Self::default())
        }
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("state path has no parent: {}", path.display()))?;
        fs::create_dir_all(dir).with_context(|| {
            format!(
                "failed to prepare directory for state file at {}",
                dir.display()
            )
        })?;
        let serialized = toml::to_string_pretty(self)
            .with_context(|| "failed to serialize state file to TOML".to_string())?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write state file to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_default() {
        let root = TempDir::new().unwrap();
        let state = AppState::load_or_default(&root.path().join("state.toml")).unwrap();
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn persisted_theme_is_reloaded() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("nested/state.toml");
        let state = AppState {
            theme: Some("light".into()),
        };
        state.persist(&path).unwrap();
        assert_eq!(AppState::load_or_default(&path).unwrap(), state);
    }

    #[test]
    fn corrupt_state_is_reported() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("state.toml");
        fs::write(&path, "theme = [").unwrap();
        let err = AppState::load_or_default(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse state file"));
    }
}

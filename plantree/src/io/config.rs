//! User configuration stored at `~/.config/plantree/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// plantree configuration (TOML).
///
/// Missing fields default to the built-in behavior, so an empty file is
/// valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlantreeConfig {
    /// Capture mouse clicks and wheel events in the tree view.
    pub mouse: bool,

    /// Show scope openers expanded instead of collapsed.
    pub start_expanded: bool,

    pub dialog: DialogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DialogConfig {
    /// Label of the single confirming button.
    pub confirm_label: String,
    /// Label of the three cancelling buttons.
    pub cancel_label: String,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            confirm_label: "Yes".to_string(),
            cancel_label: "No".to_string(),
        }
    }
}

impl Default for PlantreeConfig {
    fn default() -> Self {
        Self {
            mouse: true,
            start_expanded: false,
            dialog: DialogConfig::default(),
        }
    }
}

impl PlantreeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dialog.confirm_label.trim().is_empty() {
            return Err(anyhow!("dialog.confirm_label must not be empty"));
        }
        if self.dialog.cancel_label.trim().is_empty() {
            return Err(anyhow!("dialog.cancel_label must not be empty"));
        }
        if self.dialog.confirm_label == self.dialog.cancel_label {
            return Err(anyhow!(
                "dialog.confirm_label and dialog.cancel_label must differ"
            ));
        }
        Ok(())
    }
}

/// Default config location: `$XDG_CONFIG_HOME/plantree/config.toml`,
/// falling back to `$HOME/.config/plantree/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("plantree").join("config.toml"))
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PlantreeConfig::default()`.
pub fn load_config(path: &Path) -> Result<PlantreeConfig> {
    if !path.exists() {
        let cfg = PlantreeConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PlantreeConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

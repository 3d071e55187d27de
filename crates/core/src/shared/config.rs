use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::detection_result::DetectorKind;
use crate::shared::constants::{DEFAULT_MIN_PRESENCE, FACE_MODEL_NAME, HAND_MODEL_NAME};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Bridge settings, stored as JSON.
///
/// Every field is optional in the file; missing ones take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Directory holding bundled model assets.
    pub asset_dir: Option<PathBuf>,
    /// Logical name of the face model asset.
    pub face_model: String,
    pub hand_model: String,
    pub face_model_url: Option<String>,
    pub hand_model_url: Option<String>,
    /// Fetch models with a configured URL into the cache when absent.
    pub download_missing: bool,
    /// Presence score below which a frame reports no face/hand.
    pub min_presence: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            asset_dir: None,
            face_model: FACE_MODEL_NAME.to_string(),
            hand_model: HAND_MODEL_NAME.to_string(),
            face_model_url: None,
            hand_model_url: None,
            download_missing: false,
            min_presence: DEFAULT_MIN_PRESENCE,
        }
    }
}

impl BridgeConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("landmark-bridge").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the user config file, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load_or_default() -> Self {
        Self::default_path()
            .filter(|path| path.exists())
            .and_then(|path| match Self::load(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    log::warn!("{e}; using default settings");
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Model asset name for a detector kind.
    pub fn model_name(&self, kind: DetectorKind) -> &str {
        match kind {
            DetectorKind::Face => &self.face_model,
            DetectorKind::Hand => &self.hand_model,
        }
    }
}

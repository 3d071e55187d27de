use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::config::BridgeConfig;
use crate::shared::constants::MODEL_EXTENSION;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model `{name}` not found (searched {})", display_paths(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nowhere".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// File name for a logical model name: `face_landmarker` → `face_landmarker.onnx`.
/// Names that already carry an extension are kept as-is.
pub fn model_file_name(name: &str) -> String {
    if Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{name}.{MODEL_EXTENSION}")
    }
}

/// Maps logical model names to files on disk.
///
/// Resolution order:
/// 1. Asset directory supplied by the packaging layer
/// 2. User cache directory (platform-specific)
/// 3. Download from the configured URL into the cache, if enabled
#[derive(Debug, Clone)]
pub struct ModelResolver {
    asset_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    urls: HashMap<String, String>,
    download_missing: bool,
}

impl ModelResolver {
    pub fn new(asset_dir: Option<PathBuf>) -> Self {
        Self {
            asset_dir,
            cache_dir: model_cache_dir().ok(),
            urls: HashMap::new(),
            download_missing: false,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        let mut resolver = Self::new(config.asset_dir.clone());
        if let Some(url) = &config.face_model_url {
            resolver.urls.insert(config.face_model.clone(), url.clone());
        }
        if let Some(url) = &config.hand_model_url {
            resolver.urls.insert(config.hand_model.clone(), url.clone());
        }
        resolver.download_missing = config.download_missing;
        resolver
    }

    pub fn with_cache_dir(mut self, cache_dir: Option<PathBuf>) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    /// Enables downloading `name` from `url` when it is not on disk.
    pub fn with_download(mut self, name: &str, url: &str) -> Self {
        self.urls.insert(name.to_string(), url.to_string());
        self.download_missing = true;
        self
    }

    pub fn resolve(&self, name: &str) -> Result<PathBuf, ModelResolveError> {
        let file_name = model_file_name(name);
        let mut searched = Vec::new();

        if let Some(dir) = &self.asset_dir {
            let asset_path = dir.join(&file_name);
            if asset_path.exists() {
                return Ok(asset_path);
            }
            searched.push(asset_path);
        }

        if let Some(dir) = &self.cache_dir {
            let cached_path = dir.join(&file_name);
            if cached_path.exists() {
                return Ok(cached_path);
            }
            searched.push(cached_path);
        }

        match (self.download_missing, self.urls.get(name)) {
            (true, Some(url)) => {
                let cache_dir = self.cache_dir.as_ref().ok_or(ModelResolveError::NoCacheDir)?;
                fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
                let cached_path = cache_dir.join(&file_name);
                log::info!("Downloading model `{name}` from {url}");
                download(url, &cached_path)?;
                Ok(cached_path)
            }
            _ => Err(ModelResolveError::NotFound {
                name: name.to_string(),
                searched,
            }),
        }
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/LandmarkBridge/models/`
/// - Linux/Android: `$XDG_CACHE_HOME/LandmarkBridge/models/` or `~/.cache/LandmarkBridge/models/`
/// - Windows: `%LOCALAPPDATA%/LandmarkBridge/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("LandmarkBridge").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("LandmarkBridge").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let bytes = response.bytes().map_err(|e| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    })?;

    // Write to a temp file first, then rename for atomicity
    let temp_path = dest.with_extension("part");
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ModelResolveError::Write { path, source }
    };

    let mut file = fs::File::create(&temp_path).map_err(write_err(&temp_path))?;
    file.write_all(&bytes).map_err(write_err(&temp_path))?;
    file.flush().map_err(write_err(&temp_path))?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(write_err(dest))?;
    Ok(())
}

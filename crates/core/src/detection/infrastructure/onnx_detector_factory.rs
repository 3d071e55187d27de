use crate::detection::domain::detection_result::DetectorKind;
use crate::detection::domain::landmark_detector::{
    DetectorCallbacks, DetectorError, DetectorFactory, DetectorOptions, LandmarkDetector,
};
use crate::detection::domain::landmark_model::LandmarkModel;
use crate::shared::config::BridgeConfig;
use crate::shared::model_resolver::ModelResolver;

use super::onnx_face_landmarker::OnnxFaceLandmarker;
use super::onnx_hand_landmarker::OnnxHandLandmarker;
use super::threaded_landmarker::ThreadedLandmarker;

/// Builds ONNX-backed landmarkers, each on its own worker thread.
///
/// Models are resolved and loaded on the calling thread so that a missing or
/// broken asset fails `create` instead of the first detection.
pub struct OnnxDetectorFactory {
    config: BridgeConfig,
    resolver: ModelResolver,
}

impl OnnxDetectorFactory {
    pub fn new(config: BridgeConfig) -> Self {
        let resolver = ModelResolver::from_config(&config);
        Self { config, resolver }
    }

    pub fn with_resolver(config: BridgeConfig, resolver: ModelResolver) -> Self {
        Self { config, resolver }
    }

    fn load_model(&self, kind: DetectorKind) -> Result<Box<dyn LandmarkModel>, DetectorError> {
        let name = self.config.model_name(kind);
        let path = self
            .resolver
            .resolve(name)
            .map_err(|source| DetectorError::ModelUnavailable {
                name: name.to_string(),
                source,
            })?;
        log::info!("Loading {kind} model from {}", path.display());

        let min_presence = self.config.min_presence;
        let model: Result<Box<dyn LandmarkModel>, _> = match kind {
            DetectorKind::Face => OnnxFaceLandmarker::new(&path, min_presence)
                .map(|m| Box::new(m) as Box<dyn LandmarkModel>),
            DetectorKind::Hand => OnnxHandLandmarker::new(&path, min_presence)
                .map(|m| Box::new(m) as Box<dyn LandmarkModel>),
        };
        model.map_err(|e| DetectorError::Load {
            kind,
            message: e.to_string(),
        })
    }
}

impl DetectorFactory for OnnxDetectorFactory {
    fn create(
        &self,
        options: DetectorOptions,
        callbacks: DetectorCallbacks,
    ) -> Result<Box<dyn LandmarkDetector>, DetectorError> {
        let model = self.load_model(options.kind)?;
        Ok(Box::new(ThreadedLandmarker::new(
            options.kind,
            model,
            options.max_instances,
            callbacks,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn noop_callbacks() -> DetectorCallbacks {
        DetectorCallbacks {
            on_result: Arc::new(|_| {}),
            on_error: Arc::new(|_| {}),
        }
    }

    #[test]
    fn test_missing_asset_fails_at_create() {
        let assets = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let config = BridgeConfig {
            asset_dir: Some(assets.path().to_path_buf()),
            ..BridgeConfig::default()
        };
        let resolver = ModelResolver::from_config(&config)
            .with_cache_dir(Some(cache.path().to_path_buf()));
        let factory = OnnxDetectorFactory::with_resolver(config, resolver);

        let result = factory.create(DetectorOptions::for_kind(DetectorKind::Face), noop_callbacks());
        match result {
            Err(DetectorError::ModelUnavailable { name, .. }) => assert_eq!(name, "face_landmarker"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected construction to fail"),
        }
    }
}

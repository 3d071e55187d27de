use std::sync::Arc;

use thiserror::Error;

use crate::detection::domain::detection_result::{DetectorKind, LandmarkerOutput};
use crate::shared::model_resolver::ModelResolveError;
use crate::shared::pixel_image::PixelImage;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model `{name}` is unavailable: {source}")]
    ModelUnavailable {
        name: String,
        #[source]
        source: ModelResolveError,
    },
    #[error("failed to load {kind} model: {message}")]
    Load { kind: DetectorKind, message: String },
    #[error("{0}")]
    Backend(String),
    #[error(
        "Input timestamp must be monotonically increasing (got {got} ms after {previous} ms)"
    )]
    NonMonotonicTimestamp { previous: i64, got: i64 },
    #[error("{0} detector is closed")]
    Closed(DetectorKind),
    #[error("failed to release {kind} detector: {message}")]
    Release { kind: DetectorKind, message: String },
}

pub type ResultCallback = Arc<dyn Fn(LandmarkerOutput) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(DetectorError) + Send + Sync>;

/// Where a detector delivers its asynchronous outcomes.
///
/// Called from whatever thread the detector completes on.
#[derive(Clone)]
pub struct DetectorCallbacks {
    pub on_result: ResultCallback,
    pub on_error: ErrorCallback,
}

/// Construction parameters for one detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorOptions {
    pub kind: DetectorKind,
    pub max_instances: usize,
}

impl DetectorOptions {
    pub fn for_kind(kind: DetectorKind) -> Self {
        Self {
            kind,
            max_instances: kind.max_instances(),
        }
    }
}

/// Long-lived asynchronous landmark detector.
///
/// `detect_async` must return without waiting for inference; its outcome
/// arrives later through the [`DetectorCallbacks`] the detector was built
/// with. Whether frames are queued or dropped while busy is up to the
/// implementation.
pub trait LandmarkDetector: Send {
    fn kind(&self) -> DetectorKind;

    fn detect_async(&mut self, image: Arc<PixelImage>, timestamp_ms: i64);

    /// Releases the underlying resources. Later `detect_async` calls are ignored.
    fn close(&mut self) -> Result<(), DetectorError>;
}

/// Builds detectors bound to their result callbacks.
///
/// Model assets are located by the factory; a missing asset is a
/// construction error.
pub trait DetectorFactory: Send + Sync {
    fn create(
        &self,
        options: DetectorOptions,
        callbacks: DetectorCallbacks,
    ) -> Result<Box<dyn LandmarkDetector>, DetectorError>;
}

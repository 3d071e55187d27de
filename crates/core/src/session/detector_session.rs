use std::sync::{Arc, LockResult, Mutex, MutexGuard};

use thiserror::Error;

use crate::detection::domain::detection_result::{DetectionResult, DetectorKind};
use crate::detection::domain::landmark_detector::{
    DetectorCallbacks, DetectorError, DetectorFactory, DetectorOptions, LandmarkDetector,
};
use crate::events::event_dispatcher::EventPublisher;
use crate::shared::pixel_image::PixelImage;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to create {kind} detector: {source}")]
    DetectorInit {
        kind: DetectorKind,
        #[source]
        source: DetectorError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Stopped,
    Running {
        face_enabled: bool,
        hands_enabled: bool,
    },
}

#[derive(Default)]
struct Detectors {
    face: Option<Box<dyn LandmarkDetector>>,
    hand: Option<Box<dyn LandmarkDetector>>,
    running: Option<(bool, bool)>,
}

impl Detectors {
    /// Empties the slots, handing back whatever was installed.
    fn take(&mut self) -> Vec<Box<dyn LandmarkDetector>> {
        self.running = None;
        [self.face.take(), self.hand.take()]
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Closes each handle, logging and swallowing release failures.
fn release_all(detectors: Vec<Box<dyn LandmarkDetector>>) {
    for mut detector in detectors {
        if let Err(e) = detector.close() {
            log::warn!("Ignoring {} detector release failure: {e}", detector.kind());
        }
    }
}

/// Owns the face and hand detectors and their start/stop lifecycle.
///
/// `start` and `stop` are serialized by a lifecycle lock. The handle lock is
/// only held to swap handles in or out, so building or releasing detectors
/// never stalls a concurrent `submit`; such a `submit` finds no detectors and
/// does nothing.
pub struct DetectorSession {
    factory: Box<dyn DetectorFactory>,
    publisher: EventPublisher,
    lifecycle: Mutex<()>,
    detectors: Mutex<Detectors>,
}

impl DetectorSession {
    pub fn new(factory: Box<dyn DetectorFactory>, publisher: EventPublisher) -> Self {
        Self {
            factory,
            publisher,
            lifecycle: Mutex::new(()),
            detectors: Mutex::new(Detectors::default()),
        }
    }

    /// Stops any running detectors, then creates the requested ones.
    ///
    /// If any detector fails to build, those already built in this call are
    /// released too and the session stays stopped.
    pub fn start(&self, face_enabled: bool, hands_enabled: bool) -> Result<(), SessionError> {
        let _lifecycle = recover(self.lifecycle.lock());
        let previous = self.lock().take();
        release_all(previous);

        let face = if face_enabled {
            Some(self.create(DetectorKind::Face)?)
        } else {
            None
        };
        let hand = if hands_enabled {
            match self.create(DetectorKind::Hand) {
                Ok(detector) => Some(detector),
                Err(e) => {
                    release_all(face.into_iter().collect());
                    return Err(e);
                }
            }
        } else {
            None
        };

        {
            let mut detectors = self.lock();
            detectors.face = face;
            detectors.hand = hand;
            detectors.running = Some((face_enabled, hands_enabled));
        }
        log::info!("Detector session started (face: {face_enabled}, hands: {hands_enabled})");
        Ok(())
    }

    /// Hands `image` to every active detector without waiting for results.
    /// A no-op when nothing is running.
    pub fn submit(&self, image: Arc<PixelImage>, timestamp_ms: i64) {
        let mut detectors = self.lock();
        if let Some(face) = detectors.face.as_mut() {
            face.detect_async(image.clone(), timestamp_ms);
        }
        if let Some(hand) = detectors.hand.as_mut() {
            hand.detect_async(image, timestamp_ms);
        }
    }

    /// Releases both detectors. Never fails.
    pub fn stop(&self) {
        let _lifecycle = recover(self.lifecycle.lock());
        let (was_running, previous) = {
            let mut detectors = self.lock();
            (detectors.running.is_some(), detectors.take())
        };
        release_all(previous);
        if was_running {
            log::info!("Detector session stopped");
        }
    }

    pub fn state(&self) -> SessionState {
        match self.lock().running {
            Some((face_enabled, hands_enabled)) => SessionState::Running {
                face_enabled,
                hands_enabled,
            },
            None => SessionState::Stopped,
        }
    }

    fn create(&self, kind: DetectorKind) -> Result<Box<dyn LandmarkDetector>, SessionError> {
        self.factory
            .create(DetectorOptions::for_kind(kind), self.callbacks_for(kind))
            .map_err(|source| SessionError::DetectorInit { kind, source })
    }

    fn callbacks_for(&self, kind: DetectorKind) -> DetectorCallbacks {
        let results = self.publisher.clone();
        let errors = self.publisher.clone();
        DetectorCallbacks {
            on_result: Arc::new(move |output| {
                results.publish(DetectionResult::first_of(kind, output));
            }),
            on_error: Arc::new(move |err| {
                errors.publish_error(kind.error_code(), err.to_string());
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Detectors> {
        recover(self.detectors.lock())
    }
}

/// A panic while a lock was held must not wedge the bridge.
fn recover<T>(result: LockResult<MutexGuard<'_, T>>) -> MutexGuard<'_, T> {
    result.unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Drop for DetectorSession {
    fn drop(&mut self) {
        self.stop();
    }
}

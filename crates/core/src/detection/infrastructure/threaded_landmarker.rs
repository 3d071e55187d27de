use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, TrySendError};

use crate::detection::domain::detection_result::DetectorKind;
use crate::detection::domain::landmark_detector::{
    DetectorCallbacks, DetectorError, LandmarkDetector,
};
use crate::detection::domain::landmark_model::LandmarkModel;
use crate::shared::pixel_image::PixelImage;

/// Frames waiting for the worker. One slot: a frame submitted while the
/// previous one is still queued is dropped, as a live-stream landmarker does.
const QUEUE_CAPACITY: usize = 1;

struct Job {
    image: Arc<PixelImage>,
    timestamp_ms: i64,
}

/// Runs a synchronous [`LandmarkModel`] on a dedicated worker thread and
/// exposes it as an asynchronous [`LandmarkDetector`].
///
/// Layout: `detect_async → [bounded queue] → worker → callbacks`
pub struct ThreadedLandmarker {
    kind: DetectorKind,
    job_tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    callbacks: DetectorCallbacks,
    last_timestamp_ms: Option<i64>,
}

impl ThreadedLandmarker {
    pub fn new(
        kind: DetectorKind,
        model: Box<dyn LandmarkModel>,
        max_instances: usize,
        callbacks: DetectorCallbacks,
    ) -> Self {
        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(QUEUE_CAPACITY);
        let worker = spawn_worker(kind, model, max_instances, job_rx, callbacks.clone());
        Self {
            kind,
            job_tx: Some(job_tx),
            worker: Some(worker),
            callbacks,
            last_timestamp_ms: None,
        }
    }
}

fn spawn_worker(
    kind: DetectorKind,
    mut model: Box<dyn LandmarkModel>,
    max_instances: usize,
    job_rx: crossbeam_channel::Receiver<Job>,
    callbacks: DetectorCallbacks,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for job in job_rx {
            match model.infer(&job.image) {
                Ok(mut output) => {
                    output.instances.truncate(max_instances);
                    log::debug!(
                        "{kind} landmarker: {} instance(s) at {} ms",
                        output.instances.len(),
                        job.timestamp_ms
                    );
                    (callbacks.on_result)(output);
                }
                Err(e) => (callbacks.on_error)(DetectorError::Backend(e.to_string())),
            }
        }
        log::debug!("{kind} landmarker worker exiting");
    })
}

impl LandmarkDetector for ThreadedLandmarker {
    fn kind(&self) -> DetectorKind {
        self.kind
    }

    fn detect_async(&mut self, image: Arc<PixelImage>, timestamp_ms: i64) {
        let Some(job_tx) = &self.job_tx else {
            return;
        };

        if let Some(previous) = self.last_timestamp_ms {
            if timestamp_ms <= previous {
                (self.callbacks.on_error)(DetectorError::NonMonotonicTimestamp {
                    previous,
                    got: timestamp_ms,
                });
                return;
            }
        }
        self.last_timestamp_ms = Some(timestamp_ms);

        match job_tx.try_send(Job {
            image,
            timestamp_ms,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::debug!("{} landmarker busy, dropping frame at {timestamp_ms} ms", self.kind);
            }
            Err(TrySendError::Disconnected(_)) => {
                (self.callbacks.on_error)(DetectorError::Closed(self.kind));
            }
        }
    }

    fn close(&mut self) -> Result<(), DetectorError> {
        drop(self.job_tx.take());
        match self.worker.take() {
            Some(handle) => handle.join().map_err(|_| DetectorError::Release {
                kind: self.kind,
                message: "worker thread panicked".to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl Drop for ThreadedLandmarker {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::detection_result::{
        DetectedInstance, Landmark, LandmarkerOutput,
    };
    use crossbeam_channel::Receiver;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct FixedModel {
        instances: usize,
    }

    impl LandmarkModel for FixedModel {
        fn infer(
            &mut self,
            image: &PixelImage,
        ) -> Result<LandmarkerOutput, Box<dyn std::error::Error>> {
            let instances = (0..self.instances)
                .map(|i| DetectedInstance {
                    landmarks: vec![Landmark::new(i as f32, image.width() as f32, 0.0)],
                    handedness: None,
                    presence: 1.0,
                })
                .collect();
            Ok(LandmarkerOutput { instances })
        }
    }

    struct FailingModel;

    impl LandmarkModel for FailingModel {
        fn infer(
            &mut self,
            _image: &PixelImage,
        ) -> Result<LandmarkerOutput, Box<dyn std::error::Error>> {
            Err("inference exploded".into())
        }
    }

    /// Blocks inside `infer` until released, so the queue can be filled.
    struct GatedModel {
        gate: Receiver<()>,
    }

    impl LandmarkModel for GatedModel {
        fn infer(
            &mut self,
            _image: &PixelImage,
        ) -> Result<LandmarkerOutput, Box<dyn std::error::Error>> {
            let _ = self.gate.recv();
            Ok(LandmarkerOutput::empty())
        }
    }

    struct PanickingModel;

    impl LandmarkModel for PanickingModel {
        fn infer(
            &mut self,
            _image: &PixelImage,
        ) -> Result<LandmarkerOutput, Box<dyn std::error::Error>> {
            panic!("model crashed");
        }
    }

    fn recording_callbacks() -> (
        DetectorCallbacks,
        Receiver<LandmarkerOutput>,
        Receiver<String>,
    ) {
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let (error_tx, error_rx) = crossbeam_channel::unbounded();
        let callbacks = DetectorCallbacks {
            on_result: Arc::new(move |output| {
                let _ = result_tx.send(output);
            }),
            on_error: Arc::new(move |err| {
                let _ = error_tx.send(err.to_string());
            }),
        };
        (callbacks, result_rx, error_rx)
    }

    fn image() -> Arc<PixelImage> {
        Arc::new(PixelImage::new(vec![0u8; 2 * 2 * 4], 2, 2))
    }

    #[test]
    fn test_result_arrives_on_callback() {
        let (callbacks, results, _errors) = recording_callbacks();
        let mut detector =
            ThreadedLandmarker::new(DetectorKind::Face, Box::new(FixedModel { instances: 1 }), 1, callbacks);
        detector.detect_async(image(), 1);
        let output = results.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(output.instances.len(), 1);
        assert_eq!(output.instances[0].landmarks[0].y, 2.0);
        detector.close().unwrap();
    }

    #[test]
    fn test_output_truncated_to_max_instances() {
        let (callbacks, results, _errors) = recording_callbacks();
        let mut detector =
            ThreadedLandmarker::new(DetectorKind::Hand, Box::new(FixedModel { instances: 3 }), 1, callbacks);
        detector.detect_async(image(), 1);
        let output = results.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(output.instances.len(), 1);
        assert_eq!(output.instances[0].landmarks[0].x, 0.0);
    }

    #[test]
    fn test_model_error_goes_to_error_callback() {
        let (callbacks, results, errors) = recording_callbacks();
        let mut detector =
            ThreadedLandmarker::new(DetectorKind::Face, Box::new(FailingModel), 1, callbacks);
        detector.detect_async(image(), 1);
        assert_eq!(errors.recv_timeout(TIMEOUT).unwrap(), "inference exploded");
        detector.close().unwrap();
        assert!(results.try_recv().is_err());
    }

    #[test]
    fn test_non_increasing_timestamp_is_rejected() {
        let (callbacks, results, errors) = recording_callbacks();
        let mut detector =
            ThreadedLandmarker::new(DetectorKind::Face, Box::new(FixedModel { instances: 1 }), 1, callbacks);
        detector.detect_async(image(), 10);
        results.recv_timeout(TIMEOUT).unwrap();
        detector.detect_async(image(), 10);
        let message = errors.recv_timeout(TIMEOUT).unwrap();
        assert!(message.contains("monotonically increasing"));
    }

    #[test]
    fn test_busy_worker_drops_extra_frames() {
        let (gate_tx, gate_rx) = crossbeam_channel::unbounded();
        let (callbacks, results, errors) = recording_callbacks();
        let mut detector = ThreadedLandmarker::new(
            DetectorKind::Face,
            Box::new(GatedModel { gate: gate_rx }),
            1,
            callbacks,
        );
        for ts in 1..=10 {
            detector.detect_async(image(), ts);
        }
        drop(gate_tx);
        detector.close().unwrap();
        let delivered = results.try_iter().count();
        // One in flight plus at most one queued.
        assert!((1..=2).contains(&delivered), "delivered {delivered}");
        assert!(errors.try_recv().is_err());
    }

    #[test]
    fn test_detect_after_close_is_ignored() {
        let (callbacks, results, errors) = recording_callbacks();
        let mut detector =
            ThreadedLandmarker::new(DetectorKind::Face, Box::new(FixedModel { instances: 1 }), 1, callbacks);
        detector.close().unwrap();
        detector.detect_async(image(), 1);
        assert!(results.recv_timeout(Duration::from_millis(50)).is_err());
        assert!(errors.try_recv().is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let (callbacks, _results, _errors) = recording_callbacks();
        let mut detector =
            ThreadedLandmarker::new(DetectorKind::Hand, Box::new(FixedModel { instances: 0 }), 1, callbacks);
        assert!(detector.close().is_ok());
        assert!(detector.close().is_ok());
    }

    #[test]
    fn test_close_reports_panicked_worker() {
        let (callbacks, _results, _errors) = recording_callbacks();
        let mut detector =
            ThreadedLandmarker::new(DetectorKind::Face, Box::new(PanickingModel), 1, callbacks);
        detector.detect_async(image(), 1);
        assert!(matches!(
            detector.close(),
            Err(DetectorError::Release { .. })
        ));
    }
}

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    ERROR_CODE_FACE, ERROR_CODE_HAND, FACE_MODEL_NAME, HAND_MODEL_NAME, MAX_FACES, MAX_HANDS,
    UNKNOWN_HANDEDNESS,
};

/// Which landmarker a detector runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    Face,
    Hand,
}

impl DetectorKind {
    /// Logical model asset name.
    pub fn model_name(self) -> &'static str {
        match self {
            DetectorKind::Face => FACE_MODEL_NAME,
            DetectorKind::Hand => HAND_MODEL_NAME,
        }
    }

    /// Code attached to asynchronous errors from this detector.
    pub fn error_code(self) -> &'static str {
        match self {
            DetectorKind::Face => ERROR_CODE_FACE,
            DetectorKind::Hand => ERROR_CODE_HAND,
        }
    }

    pub fn max_instances(self) -> usize {
        match self {
            DetectorKind::Face => MAX_FACES,
            DetectorKind::Hand => MAX_HANDS,
        }
    }
}

impl std::fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorKind::Face => write!(f, "face"),
            DetectorKind::Hand => write!(f, "hand"),
        }
    }
}

/// Normalized keypoint: x/y in [0,1] of the image, z relative depth.
///
/// Serialized as `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f64; 3]> for Landmark {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x as f32, y as f32, z as f32)
    }
}

impl From<Landmark> for [f64; 3] {
    fn from(lm: Landmark) -> Self {
        [lm.x as f64, lm.y as f64, lm.z as f64]
    }
}

/// One detected subject as reported by a landmarker backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedInstance {
    pub landmarks: Vec<Landmark>,
    /// Category label, hands only.
    pub handedness: Option<String>,
    pub presence: f32,
}

/// Everything a landmarker found in one image, in the backend's own order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkerOutput {
    pub instances: Vec<DetectedInstance>,
}

impl LandmarkerOutput {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(instance: DetectedInstance) -> Self {
        Self {
            instances: vec![instance],
        }
    }
}

/// Result for one frame from one detector, ready to stream to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DetectionResult {
    Face {
        landmarks: Vec<Landmark>,
    },
    Hand {
        handedness: String,
        landmarks: Vec<Landmark>,
    },
}

impl DetectionResult {
    /// Keeps only the first instance of `output`.
    ///
    /// An empty output still yields a result: no landmarks, and for hands
    /// the `Unknown` handedness label.
    pub fn first_of(kind: DetectorKind, output: LandmarkerOutput) -> Self {
        let first = output.instances.into_iter().next();
        match kind {
            DetectorKind::Face => DetectionResult::Face {
                landmarks: first.map(|i| i.landmarks).unwrap_or_default(),
            },
            DetectorKind::Hand => {
                let (handedness, landmarks) = match first {
                    Some(i) => (
                        i.handedness
                            .unwrap_or_else(|| UNKNOWN_HANDEDNESS.to_string()),
                        i.landmarks,
                    ),
                    None => (UNKNOWN_HANDEDNESS.to_string(), Vec::new()),
                };
                DetectionResult::Hand {
                    handedness,
                    landmarks,
                }
            }
        }
    }

    pub fn landmarks(&self) -> &[Landmark] {
        match self {
            DetectionResult::Face { landmarks } | DetectionResult::Hand { landmarks, .. } => {
                landmarks
            }
        }
    }
}

/// Method channel the host sends commands on.
pub const METHOD_CHANNEL: &str = "mp_tasks";
/// Event channel detection results are streamed on.
pub const EVENT_CHANNEL: &str = "mp_tasks/events";

pub const FACE_MODEL_NAME: &str = "face_landmarker";
pub const HAND_MODEL_NAME: &str = "hand_landmarker";
pub const MODEL_EXTENSION: &str = "onnx";

/// Tracked instances per detector; only the first is ever surfaced.
pub const MAX_FACES: usize = 1;
pub const MAX_HANDS: usize = 1;

pub const UNKNOWN_HANDEDNESS: &str = "Unknown";

pub const ERROR_CODE_INIT: &str = "mp_init";
pub const ERROR_CODE_PROCESS: &str = "mp_process";
pub const ERROR_CODE_FACE: &str = "mp_face";
pub const ERROR_CODE_HAND: &str = "mp_hand";

/// Default presence threshold below which a landmarker reports no instance.
pub const DEFAULT_MIN_PRESENCE: f32 = 0.5;

/// Hand landmark model using ONNX Runtime via `ort`.
///
/// Whole-frame variant of the 21-point hand regressor: one hand per frame,
/// with a handedness label taken from the model's right-hand probability.
use std::path::Path;

use crate::detection::domain::detection_result::{DetectedInstance, LandmarkerOutput};
use crate::detection::domain::landmark_model::LandmarkModel;
use crate::shared::pixel_image::PixelImage;

use super::execution_provider::preferred_execution_providers;
use super::tensor::{self, TensorLayout};

const DEFAULT_INPUT_SIZE: u32 = 224;

pub const NUM_HAND_LANDMARKS: usize = 21;

pub struct OnnxHandLandmarker {
    session: ort::session::Session,
    input_size: u32,
    layout: TensorLayout,
    min_presence: f32,
}

impl OnnxHandLandmarker {
    /// Load a hand-landmark ONNX model.
    ///
    /// Output order: landmarks `[1, 63]` in input pixels, hand presence,
    /// handedness (probability of a right hand). Extra outputs such as world
    /// landmarks are ignored.
    pub fn new(model_path: &Path, min_presence: f32) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;
        let (input_size, layout) = tensor::input_geometry(&session, DEFAULT_INPUT_SIZE);
        Ok(Self {
            session,
            input_size,
            layout,
            min_presence,
        })
    }
}

/// Label for a right-hand probability.
pub fn handedness_label(right_probability: f32) -> &'static str {
    if right_probability > 0.5 {
        "Right"
    } else {
        "Left"
    }
}

impl LandmarkModel for OnnxHandLandmarker {
    fn infer(&mut self, image: &PixelImage) -> Result<LandmarkerOutput, Box<dyn std::error::Error>> {
        let input_tensor = tensor::preprocess(image, self.input_size, self.layout);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        if outputs.len() < 3 {
            return Err(format!("hand model expected 3 outputs, got {}", outputs.len()).into());
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let presence = outputs[1].try_extract_array::<f32>()?;
        let handedness = outputs[2].try_extract_array::<f32>()?;
        let coord_data = coords.as_slice().ok_or("Cannot get landmark slice")?;
        let raw_presence = *presence.iter().next().ok_or("Empty hand presence output")?;
        let raw_handedness = *handedness.iter().next().ok_or("Empty handedness output")?;

        let presence = tensor::as_probability(raw_presence);
        if presence < self.min_presence {
            return Ok(LandmarkerOutput::empty());
        }

        let landmarks = tensor::decode_landmarks(coord_data, NUM_HAND_LANDMARKS, self.input_size);
        let label = handedness_label(tensor::as_probability(raw_handedness));
        Ok(LandmarkerOutput::single(DetectedInstance {
            landmarks,
            handedness: Some(label.to_string()),
            presence,
        }))
    }
}

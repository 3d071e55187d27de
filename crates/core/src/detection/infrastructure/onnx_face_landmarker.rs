/// Face-mesh landmark model using ONNX Runtime via `ort`.
///
/// Runs the mesh regressor on the whole frame (no face-detection crop) and
/// reports a single face when the face-presence score clears the threshold.
use std::path::Path;

use crate::detection::domain::detection_result::{DetectedInstance, LandmarkerOutput};
use crate::detection::domain::landmark_model::LandmarkModel;
use crate::shared::pixel_image::PixelImage;

use super::execution_provider::preferred_execution_providers;
use super::tensor::{self, TensorLayout};

/// Fallback input resolution of the face-mesh model.
const DEFAULT_INPUT_SIZE: u32 = 192;

/// Landmarks in the face-mesh topology.
pub const NUM_FACE_LANDMARKS: usize = 468;

pub struct OnnxFaceLandmarker {
    session: ort::session::Session,
    input_size: u32,
    layout: TensorLayout,
    min_presence: f32,
}

impl OnnxFaceLandmarker {
    /// Load a face-mesh ONNX model.
    ///
    /// Expects two outputs: flat landmarks `[1, …, 468 * 3]` in input pixels,
    /// then a face-presence score (logit or probability).
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

impl LandmarkModel for OnnxFaceLandmarker {
    fn infer(&mut self, image: &PixelImage) -> Result<LandmarkerOutput, Box<dyn std::error::Error>> {
        let input_tensor = tensor::preprocess(image, self.input_size, self.layout);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        if outputs.len() < 2 {
            return Err(format!("face model expected 2 outputs, got {}", outputs.len()).into());
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let coord_data = coords.as_slice().ok_or("Cannot get landmark slice")?;
        let raw_score = *scores.iter().next().ok_or("Empty face presence output")?;

        let presence = tensor::as_probability(raw_score);
        if presence < self.min_presence {
            return Ok(LandmarkerOutput::empty());
        }

        let landmarks = tensor::decode_landmarks(coord_data, NUM_FACE_LANDMARKS, self.input_size);
        Ok(LandmarkerOutput::single(DetectedInstance {
            landmarks,
            handedness: None,
            presence,
        }))
    }
}

use crate::detection::domain::detection_result::LandmarkerOutput;
use crate::shared::pixel_image::PixelImage;

/// Synchronous landmark inference on a single image.
///
/// Implementations may keep state across calls, hence `&mut self`.
pub trait LandmarkModel: Send {
    fn infer(&mut self, image: &PixelImage) -> Result<LandmarkerOutput, Box<dyn std::error::Error>>;
}

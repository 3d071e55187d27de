//! Shared ONNX input/output helpers for the landmark models.

use crate::detection::domain::detection_result::Landmark;
use crate::shared::pixel_image::PixelImage;

/// Memory layout of a square image input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[1, 3, H, W]`
    Nchw,
    /// `[1, H, W, 3]`
    Nhwc,
}

/// Reads the square input resolution and channel layout from the model's
/// first input. Falls back to `default_size` / NHWC when the shape is
/// dynamic or unreadable.
pub fn input_geometry(session: &ort::session::Session, default_size: u32) -> (u32, TensorLayout) {
    session
        .inputs()
        .first()
        .and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                if shape.len() != 4 {
                    return None;
                }
                if shape[1] == 3 && shape[2] > 0 {
                    Some((shape[2] as u32, TensorLayout::Nchw))
                } else if shape[3] == 3 && shape[1] > 0 {
                    Some((shape[1] as u32, TensorLayout::Nhwc))
                } else {
                    None
                }
            } else {
                None
            }
        })
        .unwrap_or((default_size, TensorLayout::Nhwc))
}

/// Resize to `size × size` (nearest neighbour) and normalize RGB to [0,1].
/// Alpha is discarded.
pub fn preprocess(image: &PixelImage, size: u32, layout: TensorLayout) -> ndarray::Array4<f32> {
    let src = image.as_ndarray();
    let src_h = image.height() as usize;
    let src_w = image.width() as usize;
    let s = size as usize;

    let mut tensor = match layout {
        TensorLayout::Nchw => ndarray::Array4::<f32>::zeros((1, 3, s, s)),
        TensorLayout::Nhwc => ndarray::Array4::<f32>::zeros((1, s, s, 3)),
    };

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                let value = src[[src_y, src_x, c]] as f32 / 255.0;
                match layout {
                    TensorLayout::Nchw => tensor[[0, c, y, x]] = value,
                    TensorLayout::Nhwc => tensor[[0, y, x, c]] = value,
                }
            }
        }
    }

    tensor
}

/// Turns flat `[x, y, z, x, y, z, …]` model-pixel coordinates into
/// landmarks normalized by the input size.
///
/// Because the whole frame is stretched onto the square input, coordinates
/// normalized by the input size are also normalized to the source frame.
pub fn decode_landmarks(coords: &[f32], count: usize, size: u32) -> Vec<Landmark> {
    let s = size as f32;
    coords
        .chunks_exact(3)
        .take(count)
        .map(|p| Landmark::new(p[0] / s, p[1] / s, p[2] / s))
        .collect()
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Scores already in [0,1] are probabilities; anything else is a logit.
pub fn as_probability(score: f32) -> f32 {
    if (0.0..=1.0).contains(&score) {
        score
    } else {
        sigmoid(score)
    }
}

//! Camera buffer → RGBA conversion.
//!
//! Both YUV paths use the same BT.601 coefficients with truncating float to
//! integer conversion. They differ in where the luma offset is clamped and
//! in the summation order of the green channel, so they are kept as two
//! separate functions.

pub mod nv21;
pub mod rotation;
pub mod yuv420;

use thiserror::Error;

use crate::shared::frame_buffer::{FrameBuffer, PlaneLayout};
use crate::shared::pixel_image::PixelImage;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Unsupported pixelFormat={0}")]
    InvalidFormat(String),
    #[error("malformed buffer: {0}")]
    MalformedBuffer(String),
    #[error("rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i32),
}

/// Converts a camera frame to packed RGBA and applies its rotation.
pub fn convert(frame: &FrameBuffer) -> Result<PixelImage, ConvertError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(ConvertError::MalformedBuffer(format!(
            "dimensions must be positive, got {}x{}",
            frame.width, frame.height
        )));
    }
    let rotation = rotation::normalize(frame.rotation_degrees)?;

    let rgba = match &frame.layout {
        PlaneLayout::Nv21 { data } => nv21::nv21_to_rgba(data, frame.width, frame.height)?,
        PlaneLayout::Yuv420 {
            y,
            u,
            v,
            y_row_stride,
            u_row_stride,
            v_row_stride,
            u_pixel_stride,
            v_pixel_stride,
        } => yuv420::yuv420_to_rgba(
            &yuv420::Yuv420Planes {
                y,
                u,
                v,
                y_row_stride: *y_row_stride,
                u_row_stride: *u_row_stride,
                v_row_stride: *v_row_stride,
                u_pixel_stride: *u_pixel_stride,
                v_pixel_stride: *v_pixel_stride,
            },
            frame.width,
            frame.height,
        )?,
    };

    let image = PixelImage::new(rgba, frame.width, frame.height);
    Ok(rotation::rotate(&image, rotation))
}

/// Truncates toward zero, then clamps to a byte.
#[inline]
pub(crate) fn clamp_channel(value: f32) -> u8 {
    (value as i32).clamp(0, 255) as u8
}

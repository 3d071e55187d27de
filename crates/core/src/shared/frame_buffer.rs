use std::str::FromStr;

use crate::conversion::ConvertError;

/// Single-buffer pixel formats accepted by `processBytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Nv21,
}

impl PixelFormat {
    pub const DEFAULT: PixelFormat = PixelFormat::Nv21;
}

impl FromStr for PixelFormat {
    type Err = ConvertError;

    /// Case-insensitive; anything other than `nv21` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nv21" => Ok(PixelFormat::Nv21),
            other => Err(ConvertError::InvalidFormat(other.to_string())),
        }
    }
}

/// Raw byte layout handed off by the camera.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneLayout {
    /// Full-resolution luma followed by interleaved V,U at half resolution.
    Nv21 { data: Vec<u8> },
    /// Three independent planes; chroma may be interleaved (pixel stride > 1).
    Yuv420 {
        y: Vec<u8>,
        u: Vec<u8>,
        v: Vec<u8>,
        y_row_stride: usize,
        u_row_stride: usize,
        v_row_stride: usize,
        u_pixel_stride: usize,
        v_pixel_stride: usize,
    },
}

/// One camera frame as delivered by the host, before conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pub layout: PlaneLayout,
    pub width: u32,
    pub height: u32,
    pub rotation_degrees: i32,
    pub timestamp_ms: i64,
}

impl FrameBuffer {
    pub fn nv21(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            layout: PlaneLayout::Nv21 { data },
            width,
            height,
            rotation_degrees: 0,
            timestamp_ms: 0,
        }
    }

    pub fn with_rotation(mut self, rotation_degrees: i32) -> Self {
        self.rotation_degrees = rotation_degrees;
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn pixel_format_name(&self) -> &'static str {
        match self.layout {
            PlaneLayout::Nv21 { .. } => "nv21",
            PlaneLayout::Yuv420 { .. } => "yuv420",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("nv21")]
    #[case("NV21")]
    #[case("Nv21")]
    fn test_pixel_format_parse_ignores_case(#[case] name: &str) {
        assert_eq!(name.parse::<PixelFormat>(), Ok(PixelFormat::Nv21));
    }

    #[test]
    fn test_unknown_pixel_format_is_rejected_lowercased() {
        assert_eq!(
            "RGBA".parse::<PixelFormat>(),
            Err(ConvertError::InvalidFormat("rgba".to_string()))
        );
    }

    #[test]
    fn test_pixel_format_name_follows_layout() {
        let nv21 = FrameBuffer::nv21(vec![0; 6], 2, 2)
            .with_rotation(90)
            .with_timestamp(5);
        assert_eq!(nv21.pixel_format_name(), "nv21");
        assert_eq!((nv21.rotation_degrees, nv21.timestamp_ms), (90, 5));

        let planar = FrameBuffer {
            layout: PlaneLayout::Yuv420 {
                y: vec![0; 4],
                u: vec![0],
                v: vec![0],
                y_row_stride: 2,
                u_row_stride: 1,
                v_row_stride: 1,
                u_pixel_stride: 1,
                v_pixel_stride: 1,
            },
            ..nv21
        };
        assert_eq!(planar.pixel_format_name(), "yuv420");
    }
}

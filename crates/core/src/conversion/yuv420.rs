use super::{clamp_channel, ConvertError};

/// Borrowed view of a three-plane YUV420 frame.
#[derive(Debug, Clone, Copy)]
pub struct Yuv420Planes<'a> {
    pub y: &'a [u8],
    pub u: &'a [u8],
    pub v: &'a [u8],
    pub y_row_stride: usize,
    pub u_row_stride: usize,
    pub v_row_stride: usize,
    pub u_pixel_stride: usize,
    pub v_pixel_stride: usize,
}

impl Yuv420Planes<'_> {
    fn validate(&self, width: usize, height: usize) -> Result<(), ConvertError> {
        if width == 0 || height == 0 {
            return Err(ConvertError::MalformedBuffer(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        if self.u_pixel_stride == 0 || self.v_pixel_stride == 0 {
            return Err(ConvertError::MalformedBuffer(
                "chroma pixel stride must be at least 1".to_string(),
            ));
        }
        if self.y_row_stride < width {
            return Err(ConvertError::MalformedBuffer(format!(
                "yRowStride {} is smaller than width {width}",
                self.y_row_stride
            )));
        }
        check_plane("y", self.y, self.y_row_stride, 1, height, width)?;
        let chroma_w = width.div_ceil(2);
        let chroma_h = height.div_ceil(2);
        check_plane("u", self.u, self.u_row_stride, self.u_pixel_stride, chroma_h, chroma_w)?;
        check_plane("v", self.v, self.v_row_stride, self.v_pixel_stride, chroma_h, chroma_w)
    }
}

fn check_plane(
    name: &str,
    plane: &[u8],
    row_stride: usize,
    pixel_stride: usize,
    rows: usize,
    cols: usize,
) -> Result<(), ConvertError> {
    let row_span = (cols - 1) * pixel_stride + 1;
    if row_stride < row_span {
        return Err(ConvertError::MalformedBuffer(format!(
            "{name} row stride {row_stride} cannot hold a row of {row_span} bytes"
        )));
    }
    let needed = (rows - 1) * row_stride + row_span;
    if plane.len() < needed {
        return Err(ConvertError::MalformedBuffer(format!(
            "{name} plane of {} bytes is too small (need {needed})",
            plane.len()
        )));
    }
    Ok(())
}

/// Planar YUV420 → packed RGBA.
///
/// Unlike the NV21 path, the luma offset is computed first and `c` itself
/// is clamped: `c = Y - 16; if c < 0 { c = 0 }`.
pub fn yuv420_to_rgba(
    planes: &Yuv420Planes<'_>,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, ConvertError> {
    let w = width as usize;
    let h = height as usize;
    planes.validate(w, h)?;

    let mut out = Vec::with_capacity(w * h * 4);

    for j in 0..h {
        let p_y = planes.y_row_stride * j;
        let p_u = planes.u_row_stride * (j / 2);
        let p_v = planes.v_row_stride * (j / 2);
        for i in 0..w {
            let y = planes.y[p_y + i] as i32;
            let u = planes.u[p_u + (i / 2) * planes.u_pixel_stride] as i32;
            let v = planes.v[p_v + (i / 2) * planes.v_pixel_stride] as i32;

            let mut c = y - 16;
            if c < 0 {
                c = 0;
            }
            let c = c as f32;
            let d = (u - 128) as f32;
            let e = (v - 128) as f32;

            let r = 1.164f32 * c + 1.596f32 * e;
            let g = 1.164f32 * c - 0.392f32 * d - 0.813f32 * e;
            let b = 1.164f32 * c + 2.017f32 * d;

            out.extend_from_slice(&[clamp_channel(r), clamp_channel(g), clamp_channel(b), 255]);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planes<'a>(y: &'a [u8], u: &'a [u8], v: &'a [u8], width: usize) -> Yuv420Planes<'a> {
        let chroma_w = width.div_ceil(2);
        Yuv420Planes {
            y,
            u,
            v,
            y_row_stride: width,
            u_row_stride: chroma_w,
            v_row_stride: chroma_w,
            u_pixel_stride: 1,
            v_pixel_stride: 1,
        }
    }

    #[test]
    fn test_luma_16_is_black() {
        let y = [16u8; 4];
        let out = yuv420_to_rgba(&planes(&y, &[128], &[128], 2), 2, 2).unwrap();
        assert!(out.chunks(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn test_matches_nv21_for_equivalent_input() {
        let y = [90u8, 140, 60, 200];
        let planar = yuv420_to_rgba(&planes(&y, &[70], &[180], 2), 2, 2).unwrap();
        let mut nv21 = y.to_vec();
        nv21.extend_from_slice(&[180, 70]);
        let packed = super::super::nv21::nv21_to_rgba(&nv21, 2, 2).unwrap();
        for (a, b) in planar.iter().zip(packed.iter()) {
            assert!((*a as i32 - *b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_row_stride_padding_is_skipped() {
        // 2x2 luma with 2 bytes of padding per row.
        let y = [16u8, 16, 255, 255, 16, 16];
        let p = Yuv420Planes {
            y_row_stride: 4,
            ..planes(&y, &[128], &[128], 2)
        };
        let out = yuv420_to_rgba(&p, 2, 2).unwrap();
        assert!(out.chunks(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn test_pixel_stride_two_reads_interleaved_chroma() {
        // 4x2 frame; chroma interleaved as in a semi-planar camera buffer.
        let y = [126u8; 8];
        let uv = [128u8, 200, 128, 128];
        let p = Yuv420Planes {
            y: &y,
            u: &uv[1..],
            v: &uv[..],
            y_row_stride: 4,
            u_row_stride: 4,
            v_row_stride: 4,
            u_pixel_stride: 2,
            v_pixel_stride: 2,
        };
        // u plane starts at offset 1 and has only 3 bytes: indices 0 and 2 are read.
        let out = yuv420_to_rgba(&p, 4, 2).unwrap();
        // Column 0 pair: U=200, V=128 → strong blue.
        assert_eq!(out[2], 255);
        // Column 2 pair: U=128, V=128 → grey.
        assert_eq!(&out[8..12], &[128, 128, 128, 255]);
    }

    #[test]
    fn test_row_stride_below_width_is_malformed() {
        let y = [16u8; 4];
        let p = Yuv420Planes {
            y_row_stride: 1,
            ..planes(&y, &[128], &[128], 2)
        };
        assert!(matches!(
            yuv420_to_rgba(&p, 2, 2),
            Err(ConvertError::MalformedBuffer(_))
        ));
    }

    #[test]
    fn test_short_chroma_plane_is_malformed() {
        let y = [16u8; 16];
        let result = yuv420_to_rgba(&planes(&y, &[128; 3], &[128; 4], 4), 4, 4);
        assert!(matches!(result, Err(ConvertError::MalformedBuffer(_))));
    }

    #[test]
    fn test_zero_pixel_stride_is_malformed() {
        let y = [16u8; 4];
        let p = Yuv420Planes {
            u_pixel_stride: 0,
            ..planes(&y, &[128], &[128], 2)
        };
        assert!(yuv420_to_rgba(&p, 2, 2).is_err());
    }
}

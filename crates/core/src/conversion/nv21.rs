use super::{clamp_channel, ConvertError};

/// Minimum byte length of an NV21 buffer for `width × height`.
///
/// This is the last V,U pair actually read, not `w*h*3/2`, so buffers
/// trimmed after the final chroma pair are still accepted.
pub fn required_len(width: u32, height: u32) -> usize {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return 0;
    }
    w * h + ((h - 1) / 2) * w + ((w - 1) & !1) + 2
}

/// NV21 (luma, then interleaved V,U) → packed RGBA.
///
/// The luma offset is clamped before scaling: `c = max(0, Y - 16)`.
pub fn nv21_to_rgba(nv21: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ConvertError> {
    let needed = required_len(width, height);
    if nv21.len() < needed {
        return Err(ConvertError::MalformedBuffer(format!(
            "nv21 buffer of {} bytes is too small for {width}x{height} (need {needed})",
            nv21.len()
        )));
    }

    let w = width as usize;
    let h = height as usize;
    let frame_size = w * h;
    let mut out = Vec::with_capacity(frame_size * 4);

    for j in 0..h {
        let uv_row = frame_size + (j >> 1) * w;
        for i in 0..w {
            let y = nv21[j * w + i] as i32 - 16;
            let c = y.max(0) as f32;
            let uv_index = uv_row + (i & !1);
            let v = (nv21[uv_index] as i32 - 128) as f32;
            let u = (nv21[uv_index + 1] as i32 - 128) as f32;

            let r = 1.164f32 * c + 1.596f32 * v;
            let g = 1.164f32 * c - 0.813f32 * v - 0.392f32 * u;
            let b = 1.164f32 * c + 2.017f32 * u;

            out.extend_from_slice(&[clamp_channel(r), clamp_channel(g), clamp_channel(b), 255]);
        }
    }

    Ok(out)
}

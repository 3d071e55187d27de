use super::ConvertError;
use crate::shared::pixel_image::{PixelImage, RGBA_CHANNELS};

/// A right-angle clockwise rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Cw90,
    Cw180,
    Cw270,
}

/// Maps any multiple of 90 (negative or ≥ 360 included) onto a [`Rotation`].
pub fn normalize(degrees: i32) -> Result<Rotation, ConvertError> {
    match degrees.rem_euclid(360) {
        0 => Ok(Rotation::None),
        90 => Ok(Rotation::Cw90),
        180 => Ok(Rotation::Cw180),
        270 => Ok(Rotation::Cw270),
        _ => Err(ConvertError::InvalidRotation(degrees)),
    }
}

/// Rigid clockwise rotation into a freshly allocated image.
pub fn rotate(image: &PixelImage, rotation: Rotation) -> PixelImage {
    let w = image.width() as usize;
    let h = image.height() as usize;
    let (out_w, out_h) = match rotation {
        Rotation::None => return image.clone(),
        Rotation::Cw180 => (w, h),
        Rotation::Cw90 | Rotation::Cw270 => (h, w),
    };

    let src = image.data();
    let mut out = vec![0u8; src.len()];

    for row in 0..out_h {
        for col in 0..out_w {
            let (src_row, src_col) = match rotation {
                Rotation::Cw90 => (h - 1 - col, row),
                Rotation::Cw180 => (h - 1 - row, w - 1 - col),
                Rotation::Cw270 => (col, w - 1 - row),
                Rotation::None => (row, col),
            };
            let s = (src_row * w + src_col) * RGBA_CHANNELS;
            let d = (row * out_w + col) * RGBA_CHANNELS;
            out[d..d + RGBA_CHANNELS].copy_from_slice(&src[s..s + RGBA_CHANNELS]);
        }
    }

    PixelImage::new(out, out_w as u32, out_h as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// 3x2 image whose red channel encodes the source index.
    ///
    /// ```text
    /// 0 1 2
    /// 3 4 5
    /// ```
    fn indexed() -> PixelImage {
        let data = (0..6u8).flat_map(|i| [i, 0, 0, 255]).collect();
        PixelImage::new(data, 3, 2)
    }

    fn reds(image: &PixelImage) -> Vec<u8> {
        image.data().chunks(4).map(|px| px[0]).collect()
    }

    #[rstest]
    #[case(0, Rotation::None)]
    #[case(90, Rotation::Cw90)]
    #[case(180, Rotation::Cw180)]
    #[case(270, Rotation::Cw270)]
    #[case(360, Rotation::None)]
    #[case(-90, Rotation::Cw270)]
    #[case(-180, Rotation::Cw180)]
    fn test_normalize(#[case] degrees: i32, #[case] expected: Rotation) {
        assert_eq!(normalize(degrees).unwrap(), expected);
    }

    #[rstest]
    #[case(1)]
    #[case(45)]
    #[case(-30)]
    fn test_normalize_rejects_non_right_angles(#[case] degrees: i32) {
        assert_eq!(normalize(degrees), Err(ConvertError::InvalidRotation(degrees)));
    }

    #[test]
    fn test_rotate_none_is_identity() {
        let image = indexed();
        assert_eq!(rotate(&image, Rotation::None), image);
    }

    #[test]
    fn test_rotate_90_clockwise() {
        let out = rotate(&indexed(), Rotation::Cw90);
        assert_eq!((out.width(), out.height()), (2, 3));
        // 3 0
        // 4 1
        // 5 2
        assert_eq!(reds(&out), vec![3, 0, 4, 1, 5, 2]);
    }

    #[test]
    fn test_rotate_180() {
        let out = rotate(&indexed(), Rotation::Cw180);
        assert_eq!((out.width(), out.height()), (3, 2));
        assert_eq!(reds(&out), vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_rotate_270_clockwise() {
        let out = rotate(&indexed(), Rotation::Cw270);
        assert_eq!((out.width(), out.height()), (2, 3));
        // 2 5
        // 1 4
        // 0 3
        assert_eq!(reds(&out), vec![2, 5, 1, 4, 0, 3]);
    }

    #[test]
    fn test_four_quarter_turns_round_trip() {
        let image = indexed();
        let mut out = image.clone();
        for _ in 0..4 {
            out = rotate(&out, Rotation::Cw90);
        }
        assert_eq!(out, image);
    }
}

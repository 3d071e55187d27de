use ndarray::ArrayView3;

/// Bytes per packed RGBA pixel.
pub const RGBA_CHANNELS: usize = 4;

/// A converted camera frame: packed RGBA bytes in row-major order.
///
/// Produced once per incoming buffer, handed to the detectors read-only and
/// dropped afterwards. Alpha is always 255.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelImage {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelImage {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * RGBA_CHANNELS,
            "data length must equal width * height * 4"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// RGBA of the pixel at (`row`, `col`).
    pub fn pixel(&self, row: u32, col: u32) -> [u8; 4] {
        let i = (row as usize * self.width as usize + col as usize) * RGBA_CHANNELS;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// `(height, width, 4)` view over the pixel data.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, RGBA_CHANNELS),
            &self.data,
        )
        .expect("PixelImage data length must match dimensions")
    }
}

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

/// NHWC f32 model input built from one frame.
///
/// Owned by the caller for the duration of a single inference; dropping it
/// releases the buffer, so nothing accumulates across frames.
pub struct InputTensor {
    data: Array4<f32>,
}

impl InputTensor {
    /// Resizes `pixels` to `width` x `height` and lays the RGB values (0..=255)
    /// out as `[1, height, width, 3]`.
    pub fn from_image(pixels: &RgbImage, width: u32, height: u32) -> Self {
        let resized = imageops::resize(pixels, width, height, FilterType::Triangle);
        let mut data = Array4::<f32>::zeros((1, height as usize, width as usize, 3));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for (channel, value) in pixel.0.iter().enumerate() {
                data[[0, y as usize, x as usize, channel]] = f32::from(*value);
            }
        }
        Self { data }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn into_array(self) -> Array4<f32> {
        self.data
    }
}

use crate::error::{ParalonError, Result};
use image::{imageops::FilterType, DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// In-memory image post-processing used by the style-transfer route.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Blends a style image over a base image with mix factor `alpha`.
    ///
    /// The style image is resampled to the base image's dimensions with a
    /// Lanczos3 filter, then every channel is linearly interpolated as
    /// `(1 - alpha) * base + alpha * style` and clamped. Deterministic for
    /// identical inputs. Output is PNG-encoded at the base dimensions.
    pub fn blend(base: &[u8], style: &[u8], alpha: f32) -> Result<Vec<u8>> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(ParalonError::ImageError(format!(
                "alpha must be within [0, 1], got {}",
                alpha
            )));
        }

        let base_img = image::load_from_memory(base)?.to_rgb8();
        let (width, height) = base_img.dimensions();
        let style_img = image::load_from_memory(style)?
            .resize_exact(width, height, FilterType::Lanczos3)
            .to_rgb8();

        let mut blended = RgbImage::new(width, height);
        for (x, y, pixel) in blended.enumerate_pixels_mut() {
            let b = base_img.get_pixel(x, y);
            let s = style_img.get_pixel(x, y);
            for channel in 0..3 {
                let value =
                    (1.0 - alpha) * f32::from(b[channel]) + alpha * f32::from(s[channel]);
                pixel[channel] = value.round().clamp(0.0, 255.0) as u8;
            }
        }

        encode(&DynamicImage::ImageRgb8(blended), ImageFormat::Png)
    }

    /// Shrinks an image so neither dimension exceeds the given bounds,
    /// preserving aspect ratio. Images already within bounds pass through
    /// untouched; this never enlarges.
    pub fn resize(bytes: &[u8], max_width: u32, max_height: u32) -> Result<Vec<u8>> {
        let format = image::guess_format(bytes)?;
        let img = image::load_from_memory(bytes)?;

        if img.width() <= max_width && img.height() <= max_height {
            return Ok(bytes.to_vec());
        }

        let resized = img.resize(max_width, max_height, FilterType::Lanczos3);
        encode(&resized, format)
    }

    /// Re-encodes an image into the requested container format without
    /// resampling.
    pub fn convert(bytes: &[u8], format: ImageFormat) -> Result<Vec<u8>> {
        let img = image::load_from_memory(bytes)?;
        encode(&img, format)
    }
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb(color));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_blend_alpha_zero_reproduces_base() {
        let base = solid_png(8, 6, [200, 40, 10]);
        let style = solid_png(8, 6, [0, 255, 0]);

        let blended = ImageProcessor::blend(&base, &style, 0.0).unwrap();
        let out = image::load_from_memory(&blended).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (8, 6));
        assert!(out.pixels().all(|p| p.0 == [200, 40, 10]));
    }

    #[test]
    fn test_blend_alpha_one_reproduces_resampled_style() {
        let base = solid_png(8, 6, [200, 40, 10]);
        // Different dimensions so the style must be resampled to 8x6.
        let style = solid_png(16, 16, [0, 255, 0]);

        let blended = ImageProcessor::blend(&base, &style, 1.0).unwrap();
        let out = image::load_from_memory(&blended).unwrap().to_rgb8();
        assert_eq!(out.dimensions(), (8, 6));
        assert!(out.pixels().all(|p| p.0 == [0, 255, 0]));
    }

    #[test]
    fn test_blend_midpoint() {
        let base = solid_png(4, 4, [100, 100, 100]);
        let style = solid_png(4, 4, [200, 200, 200]);

        let blended = ImageProcessor::blend(&base, &style, 0.5).unwrap();
        let out = image::load_from_memory(&blended).unwrap().to_rgb8();
        assert!(out.pixels().all(|p| p.0 == [150, 150, 150]));
    }

    #[test]
    fn test_blend_rejects_out_of_range_alpha() {
        let base = solid_png(4, 4, [0, 0, 0]);
        let style = solid_png(4, 4, [0, 0, 0]);
        assert!(ImageProcessor::blend(&base, &style, 1.5).is_err());
        assert!(ImageProcessor::blend(&base, &style, -0.1).is_err());
    }

    #[test]
    fn test_resize_shrinks_within_bounds_preserving_aspect() {
        let bytes = solid_png(400, 200, [1, 2, 3]);
        let resized = ImageProcessor::resize(&bytes, 100, 100).unwrap();
        let out = image::load_from_memory(&resized).unwrap();
        assert!(out.width() <= 100 && out.height() <= 100);
        // 2:1 aspect ratio within one pixel of rounding.
        assert_eq!(out.width(), 100);
        assert!((out.height() as i64 - 50).abs() <= 1);
    }

    #[test]
    fn test_resize_never_enlarges() {
        let bytes = solid_png(30, 20, [1, 2, 3]);
        let resized = ImageProcessor::resize(&bytes, 1024, 1024).unwrap();
        let out = image::load_from_memory(&resized).unwrap();
        assert_eq!((out.width(), out.height()), (30, 20));
    }

    #[test]
    fn test_convert_changes_container() {
        let bytes = solid_png(10, 10, [9, 9, 9]);
        let jpeg = ImageProcessor::convert(&bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!(image::guess_format(&jpeg).unwrap(), ImageFormat::Jpeg);
    }
}

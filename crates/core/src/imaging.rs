//! Raster image codec for the pipeline.
//!
//! Every frame that crosses a storage boundary goes through this
//! module: decoding API/user bytes, normalizing color model and
//! dimensions, PNG re-encoding, and final GIF composition. Keeping
//! the codec in one place is what makes frame bytes canonical — a
//! round that re-runs after a crash reproduces the exact same blob.

use std::io::Cursor;

use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::FilterType;
use image::{Delay, DynamicImage, Frame, ImageFormat, RgbImage};

use crate::error::CoreError;

/// Content type of every stored frame blob.
pub const CONTENT_TYPE_PNG: &str = "image/png";

/// Content type of the final animation blob.
pub const CONTENT_TYPE_GIF: &str = "image/gif";

/// Decode raster bytes in any supported container format.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, CoreError> {
    image::load_from_memory(bytes).map_err(|e| CoreError::Image(format!("Decode failed: {e}")))
}

/// Encode an RGB image as PNG.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, CoreError> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| CoreError::Image(format!("PNG encode failed: {e}")))?;
    Ok(cursor.into_inner())
}

/// Downsample `img` so that neither dimension exceeds `max_dim`,
/// preserving aspect ratio with a Lanczos filter. Images already
/// within bounds pass through untouched.
pub fn shrink_to_fit(img: DynamicImage, max_dim: u32) -> DynamicImage {
    if img.width().max(img.height()) <= max_dim {
        return img;
    }
    img.resize(max_dim, max_dim, FilterType::Lanczos3)
}

/// Convert to the fixed RGB color model and resample to exactly
/// `(width, height)`.
///
/// Applied to every generated frame so that all frames of a job share
/// the source image's dimensions regardless of what size the external
/// API returned.
pub fn normalize_to(img: &DynamicImage, width: u32, height: u32) -> RgbImage {
    let rgb = img.to_rgb8();
    if rgb.dimensions() == (width, height) {
        return rgb;
    }
    image::imageops::resize(&rgb, width, height, FilterType::Lanczos3)
}

/// Compose RGB frames into a single infinitely-looping GIF, in the
/// order given, each displayed for `frame_delay_ms`.
pub fn encode_gif(frames: &[RgbImage], frame_delay_ms: u32) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| CoreError::Image(format!("GIF encode failed: {e}")))?;
        for rgb in frames {
            let rgba = DynamicImage::ImageRgb8(rgb.clone()).to_rgba8();
            let frame = Frame::from_parts(rgba, 0, 0, Delay::from_numer_denom_ms(frame_delay_ms, 1));
            encoder
                .encode_frame(frame)
                .map_err(|e| CoreError::Image(format!("GIF encode failed: {e}")))?;
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{AnimationDecoder, Rgb};

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(rgb))
    }

    #[test]
    fn png_roundtrip_preserves_pixels() {
        let img = solid(3, 2, [10, 20, 30]);
        let png = encode_png(&img).unwrap();
        let back = decode(&png).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(back.get_pixel(1, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"definitely not an image").is_err());
    }

    #[test]
    fn shrink_passes_through_small_images() {
        let img = DynamicImage::ImageRgb8(solid(100, 50, [0, 0, 0]));
        let out = shrink_to_fit(img, 1024);
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn shrink_caps_largest_dimension_preserving_aspect() {
        let img = DynamicImage::ImageRgb8(solid(2048, 1024, [0, 0, 0]));
        let out = shrink_to_fit(img, 1024);
        assert_eq!((out.width(), out.height()), (1024, 512));

        let tall = DynamicImage::ImageRgb8(solid(500, 2000, [0, 0, 0]));
        let out = shrink_to_fit(tall, 1000);
        assert_eq!((out.width(), out.height()), (250, 1000));
    }

    #[test]
    fn normalize_resamples_to_exact_dimensions() {
        let img = DynamicImage::ImageRgb8(solid(8, 8, [200, 100, 50]));
        let out = normalize_to(&img, 4, 4);
        assert_eq!(out.dimensions(), (4, 4));
        // A solid color must survive resampling (within rounding).
        let px = out.get_pixel(2, 2);
        assert!(px[0].abs_diff(200) <= 2 && px[1].abs_diff(100) <= 2 && px[2].abs_diff(50) <= 2);
    }

    #[test]
    fn gif_contains_all_frames_in_order_with_delay() {
        let frames = vec![
            solid(4, 4, [255, 0, 0]),
            solid(4, 4, [0, 255, 0]),
            solid(4, 4, [0, 0, 255]),
        ];
        let gif = encode_gif(&frames, 100).unwrap();

        let decoder = image::codecs::gif::GifDecoder::new(Cursor::new(gif)).unwrap();
        let decoded = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(decoded.len(), 3);

        let (numer, denom) = decoded[0].delay().numer_denom_ms();
        assert_eq!(numer / denom, 100);

        // Frame order must match input order. GIF quantizes colors, so
        // compare dominant channels rather than exact values.
        let first = decoded[0].buffer().get_pixel(0, 0);
        let last = decoded[2].buffer().get_pixel(0, 0);
        assert!(first[0] > first[2], "first frame should be red-dominant");
        assert!(last[2] > last[0], "last frame should be blue-dominant");
    }
}

//! JPEG thumbnail generation for image uploads.
//!
//! Decoding and re-encoding are CPU-bound, so the work runs on the
//! blocking thread pool instead of stalling the async executor.

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;

/// Decodes `data`, scales it to fit within `max_dimension` on both axes
/// while preserving aspect ratio, and re-encodes it as JPEG.
pub async fn generate_thumbnail(data: Bytes, max_dimension: u32) -> AppResult<Bytes> {
    let result = tokio::task::spawn_blocking(move || -> AppResult<Bytes> {
        let source = image::load_from_memory(&data).map_err(|e| {
            AppError::with_source(
                ErrorKind::Validation,
                "File is not a decodable image",
                e,
            )
        })?;

        let scaled = source.thumbnail(max_dimension, max_dimension);

        // JPEG cannot encode an alpha channel, so flatten to RGB first.
        let rgb = DynamicImage::ImageRgb8(scaled.into_rgb8());

        let mut encoded = Cursor::new(Vec::new());
        rgb.write_to(&mut encoded, ImageFormat::Jpeg).map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to encode thumbnail", e)
        })?;

        Ok(Bytes::from(encoded.into_inner()))
    })
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Internal, "Thumbnail task panicked", e))?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn png_fixture(width: u32, height: u32) -> Bytes {
        let pixels = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let mut encoded = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(pixels)
            .write_to(&mut encoded, ImageFormat::Png)
            .unwrap();
        Bytes::from(encoded.into_inner())
    }

    #[tokio::test]
    async fn scales_down_and_encodes_jpeg() {
        let original = png_fixture(640, 480);

        let thumb = generate_thumbnail(original, 128).await.unwrap();

        let decoded = image::load_from_memory(&thumb).unwrap();
        assert!(decoded.width() <= 128);
        assert!(decoded.height() <= 128);
        assert_eq!(
            image::guess_format(&thumb).unwrap(),
            ImageFormat::Jpeg,
            "thumbnail should re-encode as JPEG"
        );
    }

    #[tokio::test]
    async fn small_images_are_not_upscaled() {
        let original = png_fixture(32, 20);

        let thumb = generate_thumbnail(original, 128).await.unwrap();

        let decoded = image::load_from_memory(&thumb).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 20);
    }

    #[tokio::test]
    async fn rejects_non_image_bytes() {
        let err = generate_thumbnail(Bytes::from_static(b"not an image"), 128)
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
    }
}

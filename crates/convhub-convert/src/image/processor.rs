//! Image convert, compress, crop, and watermark.
//!
//! Decoding and encoding are CPU-bound and run on the blocking pool.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::{debug, info};

use convhub_core::config::ConversionConfig;
use convhub_core::types::format::{Format, FormatFamily};

use super::params::{CompressParams, CropParams, WatermarkParams};
use super::watermark::Watermarker;
use crate::error::ConversionError;
use crate::models::{ProcessedImage, UploadedFile};
use crate::scratch::ScratchDir;

/// JPEG quality used by plain format conversion.
const CONVERT_JPEG_QUALITY: u8 = 80;

/// Image operations backed by the `image` crate.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    scratch: ScratchDir,
    watermarker: Arc<Watermarker>,
}

impl ImageProcessor {
    /// Create a processor writing outputs through `scratch`.
    pub fn new(scratch: ScratchDir, config: &ConversionConfig) -> Self {
        Self::with_watermarker(scratch, Watermarker::new(config.watermark_font_family.clone()))
    }

    /// Create a processor with a preconfigured watermarker.
    pub fn with_watermarker(scratch: ScratchDir, watermarker: Watermarker) -> Self {
        Self {
            scratch,
            watermarker: Arc::new(watermarker),
        }
    }

    /// Scratch directory used for outputs.
    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Re-encode an image into `target` without resizing.
    pub async fn convert(&self, bytes: Bytes, target: Format) -> Result<Bytes, ConversionError> {
        if target.family() != FormatFamily::Image {
            return Err(ConversionError::Unsupported {
                source_format: sniff_format(&bytes).unwrap_or(Format::Jpg),
                target,
            });
        }

        let encoded = tokio::task::spawn_blocking(move || {
            let image = decode(&bytes)?;
            encode(&image, target, Some(CONVERT_JPEG_QUALITY))
        })
        .await??;

        debug!(target = %target, size = encoded.len(), "Image converted");
        Ok(Bytes::from(encoded))
    }

    /// Re-encode at the given quality. PNG and WebP keep their format;
    /// everything else becomes JPEG.
    pub async fn compress(
        &self,
        file: &UploadedFile,
        params: CompressParams,
    ) -> Result<ProcessedImage, ConversionError> {
        let params = CompressParams::new(params.quality)?;
        ensure_not_empty(file)?;

        let scratch = self.scratch.clone();
        let name = file.name.clone();
        let bytes = file.bytes.clone();

        let output = tokio::task::spawn_blocking(move || {
            let image = decode(&bytes)?;
            let format = match sniff_format(&bytes) {
                Some(Format::Png) => Format::Png,
                Some(Format::Webp) => Format::Webp,
                _ => Format::Jpg,
            };
            let encoded = encode(&image, format, Some(params.quality()))?;
            persist(&scratch, &name, "compressed", format, encoded)
        })
        .await??;

        info!(
            filename = %output.filename,
            quality = params.quality(),
            "Image compressed"
        );
        Ok(output)
    }

    /// Extract a rectangle; the output keeps the source format.
    pub async fn crop(
        &self,
        file: &UploadedFile,
        params: CropParams,
    ) -> Result<ProcessedImage, ConversionError> {
        let rect = params.rect()?;
        ensure_not_empty(file)?;

        let scratch = self.scratch.clone();
        let name = file.name.clone();
        let bytes = file.bytes.clone();
        let fallback = file.source_format();

        let output = tokio::task::spawn_blocking(move || {
            let image = decode(&bytes)?;
            let (image_width, image_height) = image.dimensions();

            let right = u64::from(rect.left) + u64::from(rect.width);
            let bottom = u64::from(rect.top) + u64::from(rect.height);
            if right > u64::from(image_width) || bottom > u64::from(image_height) {
                return Err(ConversionError::CropOutOfBounds {
                    left: rect.left,
                    top: rect.top,
                    width: rect.width,
                    height: rect.height,
                    image_width,
                    image_height,
                });
            }

            let cropped = image.crop_imm(rect.left, rect.top, rect.width, rect.height);
            let format = output_format(&bytes, fallback);
            let encoded = encode(&cropped, format, None)?;
            persist(&scratch, &name, "cropped", format, encoded)
        })
        .await??;

        info!(filename = %output.filename, ?rect, "Image cropped");
        Ok(output)
    }

    /// Overlay text sized at `min(width, height) / 20`; the output keeps
    /// the source format.
    pub async fn watermark(
        &self,
        file: &UploadedFile,
        params: WatermarkParams,
    ) -> Result<ProcessedImage, ConversionError> {
        let text = params.checked_text()?.to_string();
        ensure_not_empty(file)?;

        let scratch = self.scratch.clone();
        let watermarker = Arc::clone(&self.watermarker);
        let name = file.name.clone();
        let bytes = file.bytes.clone();
        let fallback = file.source_format();
        let (anchor, opacity) = (params.position, params.opacity);

        let output = tokio::task::spawn_blocking(move || {
            let mut canvas = decode(&bytes)?.to_rgba8();
            watermarker.apply(&mut canvas, &text, anchor, opacity)?;

            let format = output_format(&bytes, fallback);
            let encoded = encode(&DynamicImage::ImageRgba8(canvas), format, None)?;
            persist(&scratch, &name, "watermarked", format, encoded)
        })
        .await??;

        info!(filename = %output.filename, position = %anchor, "Watermark added");
        Ok(output)
    }
}

fn ensure_not_empty(file: &UploadedFile) -> Result<(), ConversionError> {
    if file.bytes.is_empty() {
        Err(ConversionError::EmptyInput)
    } else {
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, ConversionError> {
    image::load_from_memory(bytes).map_err(ConversionError::ImageDecode)
}

/// Detect the image format from the content rather than the name.
fn sniff_format(bytes: &[u8]) -> Option<Format> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some(Format::Png),
        ImageFormat::Jpeg => Some(Format::Jpg),
        ImageFormat::WebP => Some(Format::Webp),
        ImageFormat::Gif => Some(Format::Gif),
        _ => None,
    }
}

fn output_format(bytes: &[u8], fallback: Option<Format>) -> Format {
    sniff_format(bytes)
        .or(fallback.filter(|f| f.family() == FormatFamily::Image))
        .unwrap_or(Format::Jpg)
}

/// Encode `image` as `format`. `quality` drives JPEG quality and PNG
/// compression effort; WebP output is lossless.
fn encode(
    image: &DynamicImage,
    format: Format,
    quality: Option<u8>,
) -> Result<Vec<u8>, ConversionError> {
    let mut out = Cursor::new(Vec::new());

    let result = match format.canonical() {
        Format::Jpg => {
            let quality = quality.unwrap_or(CONVERT_JPEG_QUALITY).clamp(1, 100);
            let encoder = JpegEncoder::new_with_quality(&mut out, quality);
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
        }
        Format::Png => {
            let compression = match quality {
                Some(q) if q < 34 => CompressionType::Best,
                Some(q) if q < 67 => CompressionType::Default,
                Some(_) => CompressionType::Fast,
                None => CompressionType::Default,
            };
            let encoder = PngEncoder::new_with_quality(&mut out, compression, FilterType::Adaptive);
            image.write_with_encoder(encoder)
        }
        Format::Webp => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut out, ImageFormat::WebP)
        }
        Format::Gif => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_to(&mut out, ImageFormat::Gif)
        }
        other => {
            return Err(ConversionError::Unsupported {
                source_format: other,
                target: format,
            });
        }
    };

    result.map_err(|source| ConversionError::ImageEncode { format, source })?;
    Ok(out.into_inner())
}

/// Round-trip the encoded bytes through a scratch file that is deleted
/// before returning.
fn persist(
    scratch: &ScratchDir,
    original_name: &str,
    suffix: &str,
    format: Format,
    encoded: Vec<u8>,
) -> Result<ProcessedImage, ConversionError> {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| {
            Format::from_extension(e).is_some_and(|f| f.canonical() == format.canonical())
        })
        .unwrap_or(format.extension())
        .to_string();

    let mut file = scratch.create(original_name, suffix, &extension)?;
    file.write_all(&encoded)?;
    let filename = file.filename().to_string();
    let bytes = file.finish()?;

    Ok(ProcessedImage {
        filename,
        format,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::params::Anchor;
    use image::{Rgba, RgbaImage};
    use resvg::usvg::fontdb;

    fn processor(dir: &Path) -> ImageProcessor {
        let watermarker =
            Watermarker::with_fonts(Arc::new(fontdb::Database::new()), "Arial, sans-serif");
        ImageProcessor::with_watermarker(ScratchDir::new(dir), watermarker)
    }

    fn png(width: u32, height: u32) -> Bytes {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        Bytes::from(out.into_inner())
    }

    fn upload(name: &str, bytes: Bytes) -> UploadedFile {
        UploadedFile::new(name, Some("image/png".to_string()), bytes)
    }

    #[tokio::test]
    async fn test_crop_exact_region() {
        let dir = tempfile::tempdir().unwrap();
        let out = processor(dir.path())
            .crop(
                &upload("square.png", png(200, 200)),
                CropParams::new(50.0, 50.0, 100.0, 100.0),
            )
            .await
            .unwrap();

        assert_eq!(out.format, Format::Png);
        assert!(out.filename.ends_with("-square-cropped.png"));
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (100, 100));
        // Scratch file is gone once the bytes are in memory.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_crop_out_of_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let err = processor(dir.path())
            .crop(
                &upload("small.png", png(100, 100)),
                CropParams::new(9999.0, 9999.0, 10.0, 10.0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::CropOutOfBounds { .. }));
    }

    #[tokio::test]
    async fn test_crop_zero_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = processor(dir.path())
            .crop(
                &upload("small.png", png(100, 100)),
                CropParams::new(0.0, 0.0, 0.0, 0.0),
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_compress_rejects_quality_before_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let file = upload("broken.png", Bytes::from_static(b"not an image"));
        let err = processor(dir.path())
            .compress(&file, CompressParams { quality: 101 })
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::InvalidQuality { .. }));
    }

    #[tokio::test]
    async fn test_compress_keeps_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = processor(dir.path())
            .compress(&upload("pic.png", png(32, 32)), CompressParams { quality: 50 })
            .await
            .unwrap();
        assert_eq!(out.format, Format::Png);
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_compress_gif_becomes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let processor = processor(dir.path());
        let gif = processor.convert(png(16, 16), Format::Gif).await.unwrap();

        let out = processor
            .compress(&upload("anim.gif", gif), CompressParams { quality: 60 })
            .await
            .unwrap();
        assert_eq!(out.format, Format::Jpg);
        assert!(out.filename.ends_with("-anim-compressed.jpg"));
        assert_eq!(out.content_type(), "image/jpeg");
    }

    #[tokio::test]
    async fn test_convert_every_image_target() {
        let dir = tempfile::tempdir().unwrap();
        let processor = processor(dir.path());
        for (target, expected) in [
            (Format::Jpg, ImageFormat::Jpeg),
            (Format::Jpeg, ImageFormat::Jpeg),
            (Format::Webp, ImageFormat::WebP),
            (Format::Gif, ImageFormat::Gif),
            (Format::Png, ImageFormat::Png),
        ] {
            let out = processor.convert(png(20, 10), target).await.unwrap();
            assert_eq!(image::guess_format(&out).unwrap(), expected, "{target}");
            assert_eq!(image::load_from_memory(&out).unwrap().dimensions(), (20, 10));
        }
    }

    #[tokio::test]
    async fn test_convert_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let err = processor(dir.path())
            .convert(Bytes::from_static(b"plain text"), Format::Png)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::ImageDecode(_)));
    }

    #[tokio::test]
    async fn test_watermark_draws_text_and_keeps_format() {
        let dir = tempfile::tempdir().unwrap();
        let processor = ImageProcessor::with_watermarker(
            ScratchDir::new(dir.path()),
            Watermarker::new("Arial, sans-serif"),
        );
        let source = RgbaImage::from_pixel(120, 80, Rgba([255, 255, 255, 255]));
        let mut encoded = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(source.clone())
            .write_to(&mut encoded, ImageFormat::Png)
            .unwrap();
        let params = WatermarkParams::new("CONFIDENTIAL")
            .with_position(Anchor::BottomRight)
            .with_opacity(1.0);

        let result = processor
            .watermark(&upload("doc.png", Bytes::from(encoded.into_inner())), params)
            .await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let out = match result {
            Ok(out) => out,
            // Hosts without any font must fail loudly instead of returning
            // the untouched image.
            Err(err) => {
                assert!(matches!(err, ConversionError::Watermark { .. }));
                return;
            }
        };
        assert_eq!(out.format, Format::Png);
        assert!(out.filename.ends_with("-doc-watermarked.png"));

        let marked = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
        assert_eq!(marked.dimensions(), (120, 80));
        let changed = marked
            .pixels()
            .zip(source.pixels())
            .filter(|(a, b)| a != b)
            .count();
        assert!(changed > 0);
    }

    #[tokio::test]
    async fn test_watermark_without_fonts_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = processor(dir.path())
            .watermark(&upload("doc.png", png(40, 40)), WatermarkParams::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Watermark { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_watermark_requires_text() {
        let dir = tempfile::tempdir().unwrap();
        let params = WatermarkParams {
            text: None,
            position: Anchor::Center,
            opacity: 0.5,
        };
        let err = processor(dir.path())
            .watermark(&upload("doc.png", png(10, 10)), params)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::MissingWatermarkText));
    }
}

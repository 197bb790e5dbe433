//! Target format encoders.
//!
//! Both targets carry the same metadata: the canonical sRGB ICC profile and
//! the source EXIF block (bare TIFF, orientation already normalized).

use crate::error::{ConvertError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use shared_utils::image_formats::webp::embed_metadata;
use std::io::Write;

/// libwebp effort level; 6 is the slowest, best-compressing setting.
const WEBP_METHOD: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetFormat {
    #[default]
    Jpeg,
    Webp,
}

impl TargetFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Webp => "webp",
        }
    }

    pub fn encode<W: Write>(
        self,
        writer: W,
        image: &RgbImage,
        quality: u8,
        exif: Option<&[u8]>,
        icc_profile: &[u8],
    ) -> Result<()> {
        let quality = quality.clamp(1, 100);
        match self {
            TargetFormat::Jpeg => encode_jpeg(writer, image, quality, exif, icc_profile),
            TargetFormat::Webp => encode_webp(writer, image, quality, exif, icc_profile),
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetFormat::Jpeg => write!(f, "JPEG"),
            TargetFormat::Webp => write!(f, "WebP"),
        }
    }
}

fn encode_jpeg<W: Write>(
    mut writer: W,
    image: &RgbImage,
    quality: u8,
    exif: Option<&[u8]>,
    icc_profile: &[u8],
) -> Result<()> {
    // Baseline JPEG with full-resolution chroma (4:4:4) and the standard
    // Huffman tables.
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    encoder
        .set_icc_profile(icc_profile.to_vec())
        .map_err(|e| ConvertError::Encode(e.to_string()))?;
    if let Some(exif) = exif {
        encoder
            .set_exif_metadata(exif.to_vec())
            .map_err(|e| ConvertError::Encode(e.to_string()))?;
    }
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    writer.flush()?;
    Ok(())
}

fn encode_webp<W: Write>(
    mut writer: W,
    image: &RgbImage,
    quality: u8,
    exif: Option<&[u8]>,
    icc_profile: &[u8],
) -> Result<()> {
    let mut config = webp::WebPConfig::new()
        .map_err(|_| ConvertError::Encode("libwebp config init failed".into()))?;
    config.quality = f32::from(quality);
    config.method = WEBP_METHOD;
    config.lossless = 0;

    let encoded = webp::Encoder::from_rgb(image.as_raw(), image.width(), image.height())
        .encode_advanced(&config)
        .map_err(|e| ConvertError::Encode(format!("libwebp: {:?}", e)))?;

    let muxed = embed_metadata(
        &encoded,
        image.width(),
        image.height(),
        Some(icc_profile),
        exif,
    )?;
    writer.write_all(&muxed)?;
    writer.flush()?;
    Ok(())
}

//! Color pipeline: decoded pixels + optional embedded ICC profile → sRGB.
//!
//! Without a profile the pixels are taken as sRGB already and only the
//! color model is converted. With one, lcms2 runs a perceptual transform
//! from the embedded profile into a freshly built sRGB profile, whose
//! serialized bytes travel with the result for embedding in the output.

use crate::error::{ConvertError, Result};
use image::{DynamicImage, RgbImage};
use lcms2::{ColorSpaceSignature, Intent, PixelFormat, Profile, Transform};
use rgb::{FromSlice, RGB8};

/// Pixels in sRGB plus the ICC bytes describing them.
#[derive(Debug, Clone)]
pub struct SrgbImage {
    pub pixels: RgbImage,
    pub icc_profile: Vec<u8>,
}

fn profile_error(e: lcms2::Error) -> ConvertError {
    ConvertError::ColorProfile(e.to_string())
}

/// Serialized canonical sRGB profile.
pub fn canonical_srgb_profile() -> Result<Vec<u8>> {
    Profile::new_srgb().icc().map_err(profile_error)
}

pub fn to_srgb(image: DynamicImage, embedded_icc: Option<&[u8]>) -> Result<SrgbImage> {
    let srgb = Profile::new_srgb();
    let pixels = match embedded_icc {
        None => image.into_rgb8(),
        Some(icc) => transform_to_srgb(&image, icc, &srgb)?,
    };
    let icc_profile = srgb.icc().map_err(profile_error)?;
    Ok(SrgbImage {
        pixels,
        icc_profile,
    })
}

fn transform_to_srgb(image: &DynamicImage, icc: &[u8], srgb: &Profile) -> Result<RgbImage> {
    let source = Profile::new_icc(icc).map_err(profile_error)?;

    match source.color_space() {
        ColorSpaceSignature::RgbData => {
            let transform: Transform<RGB8, RGB8> = Transform::new(
                &source,
                PixelFormat::RGB_8,
                srgb,
                PixelFormat::RGB_8,
                Intent::Perceptual,
            )
            .map_err(profile_error)?;

            let mut pixels = image.to_rgb8();
            transform.transform_in_place((&mut *pixels).as_rgb_mut());
            Ok(pixels)
        }
        ColorSpaceSignature::GrayData => {
            let transform: Transform<u8, RGB8> = Transform::new(
                &source,
                PixelFormat::GRAY_8,
                srgb,
                PixelFormat::RGB_8,
                Intent::Perceptual,
            )
            .map_err(profile_error)?;

            let gray = image.to_luma8();
            let mut pixels = RgbImage::new(gray.width(), gray.height());
            transform.transform_pixels(gray.as_raw(), (&mut *pixels).as_rgb_mut());
            Ok(pixels)
        }
        other => Err(ConvertError::UnsupportedColorSpace(format!("{:?}", other))),
    }
}

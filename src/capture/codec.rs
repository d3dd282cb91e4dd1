//! Image codec: data URL round-trips and region cropping.
//!
//! This module has zero infrastructure dependencies.
//! It takes encoded bytes in, returns encoded bytes out.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use std::io::Cursor;

use crate::model::Selection;

/// An encoded image payload tagged with its mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new("image/png", bytes)
    }

    /// Encodes a decoded image as PNG.
    pub fn from_image(image: &DynamicImage) -> Result<Self, CodecError> {
        Ok(Self::png(encode(image, ImageFormat::Png)?))
    }

    /// Self-describing text form: `data:<mime>;base64,<payload>`.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    pub fn from_data_url(data_url: &str) -> Result<Self, CodecError> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or(CodecError::NotADataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(CodecError::NotADataUrl)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(CodecError::NotBase64)?;
        if mime.is_empty() {
            return Err(CodecError::NotADataUrl);
        }

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| CodecError::Base64(e.to_string()))?;

        Ok(Self::new(mime, bytes))
    }

    fn format(&self) -> Result<ImageFormat, CodecError> {
        ImageFormat::from_mime_type(&self.mime)
            .ok_or_else(|| CodecError::UnsupportedFormat(self.mime.clone()))
    }

    pub fn decode(&self) -> Result<DynamicImage, CodecError> {
        let format = self.format()?;
        image::load_from_memory_with_format(&self.bytes, format)
            .map_err(|e| CodecError::DecodingFailed(e.to_string()))
    }
}

/// Crops an encoded image to `rect` and re-encodes it in the source format.
///
/// The output is always exactly `rect.width × rect.height`. Parts of the
/// rectangle that fall outside the source image come out transparent, but
/// the rectangle must start inside the source and be no larger than it.
pub fn crop(image: &EncodedImage, rect: Selection) -> Result<EncodedImage, CodecError> {
    if rect.width == 0 || rect.height == 0 {
        return Err(CodecError::ZeroDimension);
    }

    let format = image.format()?;
    let source = image.decode()?;
    let cropped = crop_image(&source, rect)?;

    let bytes = encode(&cropped, format)?;
    Ok(EncodedImage::new(image.mime.clone(), bytes))
}

/// Pixel-level crop with canvas `drawImage` semantics.
pub fn crop_image(source: &DynamicImage, rect: Selection) -> Result<DynamicImage, CodecError> {
    let (img_width, img_height) = source.dimensions();

    if rect.width == 0 || rect.height == 0 {
        return Err(CodecError::ZeroDimension);
    }
    if rect.x >= img_width
        || rect.y >= img_height
        || rect.width > img_width
        || rect.height > img_height
    {
        return Err(CodecError::OutOfBounds {
            rect,
            width: img_width,
            height: img_height,
        });
    }

    if rect.x.saturating_add(rect.width) <= img_width
        && rect.y.saturating_add(rect.height) <= img_height
    {
        return Ok(source.crop_imm(rect.x, rect.y, rect.width, rect.height));
    }

    let mut canvas = RgbaImage::new(rect.width, rect.height);
    let visible_w = img_width.saturating_sub(rect.x).min(rect.width);
    let visible_h = img_height.saturating_sub(rect.y).min(rect.height);

    if visible_w > 0 && visible_h > 0 {
        let visible = source
            .crop_imm(rect.x, rect.y, visible_w, visible_h)
            .to_rgba8();
        image::imageops::replace(&mut canvas, &visible, 0, 0);
    }

    log::debug!(
        "[CAPTURE] Crop {}x{} at {},{} exceeds {}x{} source, padded",
        rect.width, rect.height, rect.x, rect.y, img_width, img_height
    );

    Ok(DynamicImage::ImageRgba8(canvas))
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, CodecError> {
    // JPEG has no alpha channel.
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image.clone(),
    };

    let mut bytes: Vec<u8> = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .map_err(|e| CodecError::EncodingFailed(e.to_string()))?;
    Ok(bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Crop rectangle has zero width or height")]
    ZeroDimension,

    #[error(
        "Crop {}x{} at {},{} does not fit a {width}x{height} source",
        .rect.width, .rect.height, .rect.x, .rect.y
    )]
    OutOfBounds {
        rect: Selection,
        width: u32,
        height: u32,
    },

    #[error("Not a data URL")]
    NotADataUrl,

    #[error("Data URL is not base64 encoded")]
    NotBase64,

    #[error("Invalid base64 payload: {0}")]
    Base64(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Image encoding failed: {0}")]
    EncodingFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnapError;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        DynamicImage::ImageRgba8(img)
    }

    fn png_of(width: u32, height: u32) -> EncodedImage {
        EncodedImage::from_image(&gradient(width, height)).unwrap()
    }

    #[test]
    fn data_url_round_trip_keeps_bytes() {
        let original = EncodedImage::new("image/png", vec![0, 1, 2, 254, 255, 10, 13]);
        let url = original.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(EncodedImage::from_data_url(&url).unwrap(), original);
    }

    #[test]
    fn rejects_malformed_data_urls() {
        assert!(matches!(
            EncodedImage::from_data_url("https://example.com/a.png"),
            Err(CodecError::NotADataUrl)
        ));
        assert!(matches!(
            EncodedImage::from_data_url("data:image/png,rawtext"),
            Err(CodecError::NotBase64)
        ));
        assert!(matches!(
            EncodedImage::from_data_url("data:image/png;base64,@@@"),
            Err(CodecError::Base64(_))
        ));
    }

    #[test]
    fn crop_valid_region() {
        let source = png_of(100, 100);
        let cropped = crop(&source, Selection { x: 10, y: 20, width: 50, height: 30 }).unwrap();
        // PNG magic bytes
        assert_eq!(&cropped.bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);

        let decoded = cropped.decode().unwrap();
        assert_eq!(decoded.dimensions(), (50, 30));
        assert_eq!(decoded.get_pixel(0, 0), Rgba([10, 20, 128, 255]));
    }

    #[test]
    fn full_size_crop_is_pixel_identical() {
        let image = gradient(40, 25);
        let source = EncodedImage::from_image(&image).unwrap();
        let cropped = crop(&source, Selection { x: 0, y: 0, width: 40, height: 25 }).unwrap();
        assert_eq!(cropped.decode().unwrap().to_rgba8(), image.to_rgba8());
    }

    #[test]
    fn crop_zero_dimension_fails() {
        let result = crop(&png_of(100, 100), Selection { x: 0, y: 0, width: 0, height: 50 });
        assert!(matches!(result, Err(CodecError::ZeroDimension)));
    }

    #[test]
    fn out_of_bounds_crop_pads_with_transparency() {
        let source = png_of(100, 100);
        let cropped = crop(&source, Selection { x: 80, y: 80, width: 30, height: 30 }).unwrap();
        let decoded = cropped.decode().unwrap();
        assert_eq!(decoded.dimensions(), (30, 30));
        assert_eq!(decoded.get_pixel(0, 0), Rgba([80, 80, 128, 255]));
        assert_eq!(decoded.get_pixel(25, 25), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn oversized_crop_is_rejected_without_allocating() {
        let source = png_of(40, 30);
        let huge = Selection { x: 0, y: 0, width: u32::MAX, height: u32::MAX };
        assert!(matches!(crop(&source, huge), Err(CodecError::OutOfBounds { .. })));

        let wider = Selection { x: 0, y: 0, width: 41, height: 30 };
        assert!(matches!(crop(&source, wider), Err(CodecError::OutOfBounds { .. })));
    }

    #[test]
    fn crop_starting_outside_source_is_rejected() {
        let source = png_of(40, 30);
        let past = Selection { x: 40, y: 0, width: 10, height: 10 };
        assert!(matches!(crop(&source, past), Err(CodecError::OutOfBounds { .. })));
        assert!(matches!(
            SnapError::from(CodecError::OutOfBounds { rect: past, width: 40, height: 30 }),
            SnapError::Validation(_)
        ));
    }

    #[test]
    fn malformed_bytes_fail_to_decode() {
        let broken = EncodedImage::png(vec![1, 2, 3, 4]);
        let result = crop(&broken, Selection { x: 0, y: 0, width: 10, height: 10 });
        assert!(matches!(result, Err(CodecError::DecodingFailed(_))));
    }

    #[test]
    fn unknown_mime_is_unsupported() {
        let odd = EncodedImage::new("image/x-unknown", vec![0; 8]);
        assert!(matches!(odd.decode(), Err(CodecError::UnsupportedFormat(_))));
    }
}

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageEncoder, ImageFormat, RgbImage};

use crate::error::FacemaskError;

/// Detect the input image format from the raw bytes.
pub(crate) fn detect_format(input: &[u8]) -> Result<ImageFormat, FacemaskError> {
    image::guess_format(input).map_err(|e| FacemaskError::DecodeError(e.to_string()))
}

/// Decode input bytes (JPEG, PNG or WebP) into an 8-bit RGB buffer.
///
/// Any alpha channel is dropped, not composited.
pub fn decode_image(input: &[u8]) -> Result<RgbImage, FacemaskError> {
    let decoded =
        image::load_from_memory(input).map_err(|e| FacemaskError::DecodeError(e.to_string()))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(FacemaskError::ZeroDimensions);
    }
    Ok(decoded.to_rgb8())
}

/// Encode an RGB image as baseline JPEG.
///
/// `quality` in `(0.0, 1.0]` maps onto the encoder's 1–100 scale. The
/// output carries no EXIF or other metadata from the source.
pub fn encode_jpeg(image: &RgbImage, quality: f32) -> Result<Vec<u8>, FacemaskError> {
    let quality_percent = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality_percent);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| FacemaskError::EncodeError(e.to_string()))?;
    Ok(buffer)
}

/// Embed JPEG bytes in a `data:` URI for inline display.
pub fn data_uri(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
}

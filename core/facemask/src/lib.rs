//! Face-region redaction for photo uploads.
//!
//! Locates the eyes, nose and mouth from facial landmarks (or falls back to
//! a central band of the image), then renders a translucent preview and an
//! opaque final redaction of that region.
//!
//! # Example
//!
//! ```no_run
//! use facemask::Redactor;
//!
//! let raw_bytes = std::fs::read("photo.jpg").unwrap();
//! let result = Redactor::new(raw_bytes)
//!     .unwrap()
//!     .padding(0.35)
//!     .redact()
//!     .unwrap();
//! std::fs::write("redacted.jpg", &result.final_image).unwrap();
//! println!("preview: {}", &result.preview_data_uri()[..40]);
//! ```
#![warn(missing_docs)]

mod codec;
/// Service configuration.
pub mod config;
mod error;
/// Facial landmark types and the detector trait.
pub mod landmarks;
/// Redaction rectangle arithmetic.
pub mod region;
/// Preview and final rendering.
pub mod render;
#[cfg(feature = "rustface")]
/// SeetaFace-based landmark detector backend.
pub mod rustface_backend;
/// Preview-to-confirmation upload flow.
pub mod service;
mod staging;
/// Object storage for confirmed uploads.
pub mod store;
pub mod upload;

use image::{Rgb, RgbImage};
use tracing::{debug, warn};

pub use codec::{data_uri, decode_image, encode_jpeg};
/// Error types returned by facemask operations.
pub use error::{DetectError, FacemaskError};
pub use landmarks::{
    Landmark, LandmarkDetector, LandmarkSet, NoFaceDetector, StaticLandmarks, Topology,
};
pub use region::{locate_region, RedactionRect};
#[cfg(feature = "rustface")]
/// Built-in detector that loads a SeetaFace model from disk.
pub use rustface_backend::RustfaceDetector;
pub use staging::Staging;

/// Default JPEG quality of the preview image.
const DEFAULT_PREVIEW_QUALITY: f32 = 0.85;

/// Default JPEG quality of the final image.
const DEFAULT_FINAL_QUALITY: f32 = 0.92;

/// Geometry and colours of a redaction, independent of encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedactionSettings {
    /// Padding around the tight landmark box, as a fraction of its size.
    pub padding: f32,
    /// Minimum side of the rectangle in pixels; 0 disables the guard.
    pub min_size: u32,
    /// Opacity of the preview overlay.
    pub preview_alpha: f64,
    /// Preview overlay colour.
    pub overlay_color: Rgb<u8>,
    /// Colour filling the final redaction.
    pub fill_color: Rgb<u8>,
}

impl Default for RedactionSettings {
    fn default() -> Self {
        Self {
            padding: region::DEFAULT_PADDING,
            min_size: 0,
            preview_alpha: render::DEFAULT_PREVIEW_ALPHA,
            overlay_color: render::PREVIEW_RED,
            fill_color: render::REDACTION_BLACK,
        }
    }
}

impl RedactionSettings {
    fn validate(&self) -> Result<(), FacemaskError> {
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(FacemaskError::InvalidPadding(self.padding));
        }
        if !(0.0..=1.0).contains(&self.preview_alpha) {
            return Err(FacemaskError::InvalidAlpha(self.preview_alpha as f32));
        }
        Ok(())
    }
}

/// Preview and final images of one redaction, still decoded.
#[derive(Debug, Clone)]
pub struct Redaction {
    /// Translucent overlay over the region.
    pub preview: RgbImage,
    /// Region filled solid.
    pub final_image: RgbImage,
    /// The region that was redacted.
    pub rect: RedactionRect,
}

/// Redact an already decoded image.
///
/// Never fails: without landmarks the fallback band is used, and both
/// outputs have the input's dimensions. An image without pixels comes back
/// unchanged with the all-zero rectangle.
pub fn redact_image(
    image: &RgbImage,
    landmarks: Option<&LandmarkSet>,
    settings: &RedactionSettings,
) -> Redaction {
    let rect = locate_region(
        image.width(),
        image.height(),
        landmarks,
        settings.padding,
        settings.min_size,
    );
    Redaction {
        preview: render::render_preview(
            image,
            rect,
            settings.overlay_color,
            settings.preview_alpha,
        ),
        final_image: render::render_final(image, rect, settings.fill_color),
        rect,
    }
}

/// Result of a single redaction.
#[derive(Debug, Clone)]
pub struct RedactedPhoto {
    /// JPEG bytes of the translucent preview.
    pub preview: Vec<u8>,

    /// JPEG bytes of the final redaction, ready for storage.
    pub final_image: Vec<u8>,

    /// Width of both images in pixels.
    pub width: u32,

    /// Height of both images in pixels.
    pub height: u32,

    /// The redacted region.
    pub rect: RedactionRect,

    /// Whether the region came from detected landmarks rather than the fallback band.
    pub face_detected: bool,

    /// Size of the original input in bytes.
    pub original_size: usize,
}

impl RedactedPhoto {
    /// The preview as a `data:image/jpeg;base64,...` URI.
    pub fn preview_data_uri(&self) -> String {
        data_uri(&self.preview)
    }
}

fn validate_quality(quality: f32) -> Result<(), FacemaskError> {
    if quality <= 0.0 || quality > 1.0 || quality.is_nan() {
        return Err(FacemaskError::InvalidQuality(quality));
    }
    Ok(())
}

/// Builder for redacting a photo.
///
/// Validates the input format on construction, then decodes, detects,
/// locates, renders and encodes on [`Redactor::redact`].
pub struct Redactor {
    input: Vec<u8>,
    settings: RedactionSettings,
    preview_quality: f32,
    final_quality: f32,
    /// When `None`, no detection runs and the fallback band is redacted.
    detector: Option<Box<dyn LandmarkDetector>>,
}

impl Redactor {
    /// Create a redactor from raw image bytes (JPEG, PNG, or WebP).
    pub fn new(input: Vec<u8>) -> Result<Self, FacemaskError> {
        codec::detect_format(&input)?;

        Ok(Self {
            input,
            settings: RedactionSettings::default(),
            preview_quality: DEFAULT_PREVIEW_QUALITY,
            final_quality: DEFAULT_FINAL_QUALITY,
            detector: None,
        })
    }

    /// Replace all geometry and colour settings at once.
    pub fn settings(mut self, settings: RedactionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the padding around the landmark box as a fraction of its
    /// width and height (default: 0.35).
    pub fn padding(mut self, padding: f32) -> Self {
        self.settings.padding = padding;
        self
    }

    /// Set the minimum side of the redaction rectangle in pixels
    /// (default: 0, degenerate rectangles pass through).
    pub fn min_size(mut self, pixels: u32) -> Self {
        self.settings.min_size = pixels;
        self
    }

    /// Set the preview overlay opacity from 0.0 to 1.0 (default: 0.65).
    pub fn preview_alpha(mut self, alpha: f64) -> Self {
        self.settings.preview_alpha = alpha;
        self
    }

    /// Set the preview overlay colour (default: red).
    pub fn overlay_color(mut self, color: [u8; 3]) -> Self {
        self.settings.overlay_color = Rgb(color);
        self
    }

    /// Set the final fill colour (default: black).
    pub fn fill_color(mut self, color: [u8; 3]) -> Self {
        self.settings.fill_color = Rgb(color);
        self
    }

    /// Set the preview JPEG quality in `(0.0, 1.0]` (default: 0.85).
    pub fn preview_quality(mut self, quality: f32) -> Self {
        self.preview_quality = quality;
        self
    }

    /// Set the final JPEG quality in `(0.0, 1.0]` (default: 0.92).
    pub fn final_quality(mut self, quality: f32) -> Self {
        self.final_quality = quality;
        self
    }

    /// Provide a landmark detector.
    ///
    /// ```no_run
    /// use facemask::{DetectError, LandmarkDetector, LandmarkSet, Redactor};
    ///
    /// struct MyDetector;
    /// impl LandmarkDetector for MyDetector {
    ///     fn detect(&self, _image: &image::RgbImage) -> Result<Option<LandmarkSet>, DetectError> {
    ///         // Your face-mesh model here
    ///         Ok(None)
    ///     }
    /// }
    ///
    /// let bytes = std::fs::read("photo.jpg").unwrap();
    /// let result = Redactor::new(bytes).unwrap()
    ///     .landmark_detector(Box::new(MyDetector))
    ///     .redact().unwrap();
    /// ```
    pub fn landmark_detector(mut self, detector: Box<dyn LandmarkDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    /// Use landmarks computed elsewhere instead of running a detector.
    pub fn landmarks(self, landmarks: LandmarkSet) -> Self {
        self.landmark_detector(Box::new(StaticLandmarks(landmarks)))
    }

    fn detect(&self, image: &RgbImage) -> Option<LandmarkSet> {
        let detector = self.detector.as_deref()?;
        match detector.detect(image) {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "landmark detection failed, redacting fallback region");
                None
            }
        }
    }

    /// Redact the photo with the configured settings.
    pub fn redact(self) -> Result<RedactedPhoto, FacemaskError> {
        self.settings.validate()?;
        validate_quality(self.preview_quality)?;
        validate_quality(self.final_quality)?;

        let image = decode_image(&self.input)?;
        let landmarks = self.detect(&image);
        let redaction = redact_image(&image, landmarks.as_ref(), &self.settings);

        debug!(
            width = image.width(),
            height = image.height(),
            face_detected = landmarks.is_some(),
            rect = ?redaction.rect,
            "redacted photo"
        );

        Ok(RedactedPhoto {
            preview: encode_jpeg(&redaction.preview, self.preview_quality)?,
            final_image: encode_jpeg(&redaction.final_image, self.final_quality)?,
            width: image.width(),
            height: image.height(),
            rect: redaction.rect,
            face_detected: landmarks.is_some(),
            original_size: self.input.len(),
        })
    }
}

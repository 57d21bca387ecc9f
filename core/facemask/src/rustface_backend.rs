use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::RgbImage;

use crate::error::{DetectError, FacemaskError};
use crate::landmarks::{LandmarkDetector, LandmarkSet};

/// Landmark detector backed by the `rustface` crate (SeetaFace engine).
///
/// SeetaFace reports face boxes only; the highest-scoring box is turned
/// into five keypoints with [`LandmarkSet::from_face_box`].
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Load a SeetaFace frontal model (`seeta_fd_frontal_v1.0.bin`).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FacemaskError> {
        let file = File::open(path)?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|e| FacemaskError::ModelError(e.to_string()))?;
        Ok(Self { model })
    }
}

impl LandmarkDetector for RustfaceDetector {
    fn detect(&self, image: &RgbImage) -> Result<Option<LandmarkSet>, DetectError> {
        let gray = image::imageops::grayscale(image);
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        let best = faces.iter().max_by(|a: &&rustface::FaceInfo, b: &&rustface::FaceInfo| {
            a.score()
                .partial_cmp(&b.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(best.map(|face| {
            let bbox = face.bbox();
            LandmarkSet::from_face_box(
                bbox.x() as f64,
                bbox.y() as f64,
                bbox.width() as f64,
                bbox.height() as f64,
                width,
                height,
            )
        }))
    }
}

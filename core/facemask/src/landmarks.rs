use image::RgbImage;

use crate::error::DetectError;

/// A facial landmark in normalized image coordinates.
///
/// `x` and `y` are fractions of the image width and height; values a
/// detector reports slightly outside `[0, 1]` are clamped when converted
/// to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    /// Horizontal position as a fraction of the image width.
    pub x: f32,
    /// Vertical position as a fraction of the image height.
    pub y: f32,
}

impl Landmark {
    /// Create a landmark from normalized coordinates.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Index sets naming the feature groups of a landmark model.
///
/// The redaction rectangle covers every point of these four groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    /// Indices of the left-eye contour.
    pub left_eye: &'static [usize],
    /// Indices of the right-eye contour.
    pub right_eye: &'static [usize],
    /// Indices along the nose bridge and tip.
    pub nose: &'static [usize],
    /// Indices of the outer and inner lip contour.
    pub mouth: &'static [usize],
}

impl Topology {
    /// The 468-point face mesh (478 with refined irises).
    pub const FACE_MESH: Topology = Topology {
        left_eye: &[33, 133, 160, 159, 158, 157, 173, 246, 163, 144, 145, 153],
        right_eye: &[362, 263, 387, 386, 385, 384, 398, 466, 373, 380, 381, 382],
        nose: &[1, 2, 4, 5, 98, 327, 94, 331, 168, 197, 419, 188, 236],
        mouth: &[61, 146, 91, 181, 84, 17, 314, 405, 321, 375, 291, 308],
    };

    /// Five keypoints: left eye, right eye, nose tip, left and right mouth corner.
    pub const FIVE_POINT: Topology = Topology {
        left_eye: &[0],
        right_eye: &[1],
        nose: &[2],
        mouth: &[3, 4],
    };

    /// All group indices, eyes first.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.left_eye
            .iter()
            .chain(self.right_eye)
            .chain(self.nose)
            .chain(self.mouth)
            .copied()
    }
}

/// Five-point layout of an aligned 112×112 face crop, normalized to the crop.
const CANONICAL_FIVE_POINT: [[f32; 2]; 5] = [
    [38.2946 / 112.0, 51.6963 / 112.0],
    [73.5318 / 112.0, 51.5014 / 112.0],
    [56.0252 / 112.0, 71.7366 / 112.0],
    [41.5493 / 112.0, 92.3655 / 112.0],
    [70.7299 / 112.0, 92.2041 / 112.0],
];

/// Landmarks of one detected face.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
    topology: Topology,
}

impl LandmarkSet {
    /// Wrap detector output laid out according to `topology`.
    pub fn new(points: Vec<Landmark>, topology: Topology) -> Self {
        Self { points, topology }
    }

    /// Approximate five-point landmarks from a face bounding box in pixels.
    ///
    /// Used by box-only detectors: the keypoints are placed at the
    /// positions they occupy in an aligned face crop.
    pub fn from_face_box(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let (iw, ih) = (image_width.max(1) as f64, image_height.max(1) as f64);
        let points = CANONICAL_FIVE_POINT
            .iter()
            .map(|[fx, fy]| {
                Landmark::new(
                    ((x + *fx as f64 * width) / iw) as f32,
                    ((y + *fy as f64 * height) / ih) as f32,
                )
            })
            .collect();
        Self::new(points, Topology::FIVE_POINT)
    }

    /// All points reported by the detector.
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// The topology naming the feature groups.
    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Points of the eye, nose and mouth groups. Indices the detector
    /// did not report are skipped.
    pub fn feature_points(&self) -> impl Iterator<Item = Landmark> + '_ {
        self.topology
            .indices()
            .filter_map(|i| self.points.get(i).copied())
    }
}

/// Pluggable facial landmark backend.
///
/// Implement this trait to plug in a face-mesh model (ONNX, MediaPipe
/// port, a remote service) and pass it to
/// [`crate::Redactor::landmark_detector`]. Returning `Ok(None)` means no
/// face was found; errors are logged and treated the same way.
pub trait LandmarkDetector: Send + Sync {
    /// Detect at most one face in an RGB image.
    fn detect(&self, image: &RgbImage) -> Result<Option<LandmarkSet>, DetectError>;
}

impl<D: LandmarkDetector + ?Sized> LandmarkDetector for std::sync::Arc<D> {
    fn detect(&self, image: &RgbImage) -> Result<Option<LandmarkSet>, DetectError> {
        (**self).detect(image)
    }
}

/// Detector that never finds a face, so the fallback region is always used.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFaceDetector;

impl LandmarkDetector for NoFaceDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Option<LandmarkSet>, DetectError> {
        Ok(None)
    }
}

/// Detector returning a fixed landmark set, e.g. landmarks computed
/// client-side or synthetic data in tests.
#[derive(Debug, Clone)]
pub struct StaticLandmarks(pub LandmarkSet);

impl LandmarkDetector for StaticLandmarks {
    fn detect(&self, _image: &RgbImage) -> Result<Option<LandmarkSet>, DetectError> {
        Ok(Some(self.0.clone()))
    }
}

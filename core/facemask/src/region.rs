use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::landmarks::LandmarkSet;

/// Fallback band used when no face is found, as fractions of the image:
/// `(left, top, right, bottom)`. Covers eyes, nose and mouth in most portraits.
const FALLBACK_BAND: (f64, f64, f64, f64) = (0.10, 0.25, 0.90, 0.80);

/// Default padding around the tight landmark box, as a fraction of its size.
pub const DEFAULT_PADDING: f32 = 0.35;

/// Axis-aligned rectangle to redact, in pixels.
///
/// Bounds are inclusive: a rectangle with `x_min == x_max` still covers one
/// column of pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionRect {
    /// Leftmost covered column.
    pub x_min: u32,
    /// Topmost covered row.
    pub y_min: u32,
    /// Rightmost covered column.
    pub x_max: u32,
    /// Bottom covered row.
    pub y_max: u32,
}

impl RedactionRect {
    /// Whether the pixel `(x, y)` is covered.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }

    /// Number of pixel columns covered.
    pub fn pixel_width(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    /// Number of pixel rows covered.
    pub fn pixel_height(&self) -> u32 {
        self.y_max - self.y_min + 1
    }
}

/// The fixed central band used when no face landmarks are available.
pub fn fallback_rect(width: u32, height: u32) -> RedactionRect {
    let (w, h) = (width as f64, height as f64);
    let (left, top, right, bottom) = FALLBACK_BAND;
    RedactionRect {
        x_min: (left * w) as u32,
        y_min: (top * h) as u32,
        x_max: (right * w) as u32,
        y_max: (bottom * h) as u32,
    }
}

/// Convert a normalized coordinate to a pixel index in `[0, dimension - 1]`.
fn to_pixel(coord: f32, dimension: u32) -> i64 {
    let max = (dimension as i64 - 1).max(0);
    ((coord as f64 * dimension as f64) as i64).clamp(0, max)
}

/// Padded bounding box of pixel points, clamped to the image.
///
/// Returns `None` for an empty point list or an image without pixels.
/// Negative or NaN `padding` is treated as 0, giving the tight box.
pub fn rect_from_points(
    points: &[(i64, i64)],
    width: u32,
    height: u32,
    padding: f32,
) -> Option<RedactionRect> {
    if width == 0 || height == 0 {
        return None;
    }
    let (first, rest) = points.split_first()?;
    let (mut x_min, mut y_min) = *first;
    let (mut x_max, mut y_max) = *first;
    for &(x, y) in rest {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    let pad = padding.max(0.0) as f64;
    let box_w = (x_max - x_min) as f64;
    let box_h = (y_max - y_min) as f64;
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    Some(RedactionRect {
        x_min: ((x_min as f64 - pad * box_w) as i64).clamp(0, max_x) as u32,
        x_max: ((x_max as f64 + pad * box_w) as i64).clamp(0, max_x) as u32,
        y_min: ((y_min as f64 - pad * box_h) as i64).clamp(0, max_y) as u32,
        y_max: ((y_max as f64 + pad * box_h) as i64).clamp(0, max_y) as u32,
    })
}

/// Grow `[lo, hi]` around its centre until it covers `min_len` pixels,
/// shifting it back inside `[0, dimension - 1]` if it overhangs.
fn grow_axis(lo: u32, hi: u32, dimension: u32, min_len: u32) -> (u32, u32) {
    let target = min_len.min(dimension);
    let len = hi - lo + 1;
    if len >= target {
        return (lo, hi);
    }
    let extra = target - len;
    let start = lo.saturating_sub(extra / 2);
    let start = start.min(dimension - target);
    (start, start + target - 1)
}

/// Locate the rectangle to redact in a `width` × `height` image.
///
/// With landmarks, the tight box over the eye, nose and mouth groups is
/// expanded by `padding` of its own size on each side. Without landmarks
/// (or when none of the group indices resolve) the fixed central band is
/// used. A `min_size` of 0 leaves degenerate boxes as they are; otherwise
/// each side is grown to at least `min_size` pixels, capped at the image.
///
/// An image without pixels gets the all-zero rectangle, which the
/// renderers treat as covering nothing.
pub fn locate_region(
    width: u32,
    height: u32,
    landmarks: Option<&LandmarkSet>,
    padding: f32,
    min_size: u32,
) -> RedactionRect {
    if width == 0 || height == 0 {
        return RedactionRect {
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
        };
    }

    let points: Vec<(i64, i64)> = landmarks
        .map(|set| {
            set.feature_points()
                .map(|p| (to_pixel(p.x, width), to_pixel(p.y, height)))
                .collect()
        })
        .unwrap_or_default();

    let rect = match rect_from_points(&points, width, height, padding) {
        Some(rect) => rect,
        None => {
            debug!(width, height, "no landmarks, using fallback band");
            fallback_rect(width, height)
        }
    };

    if min_size == 0 {
        return rect;
    }

    let (x_min, x_max) = grow_axis(rect.x_min, rect.x_max, width, min_size);
    let (y_min, y_max) = grow_axis(rect.y_min, rect.y_max, height, min_size);
    RedactionRect {
        x_min,
        y_min,
        x_max,
        y_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Landmark, Topology};

    fn clustered(x: f32, y: f32) -> LandmarkSet {
        LandmarkSet::new(vec![Landmark::new(x, y); 478], Topology::FACE_MESH)
    }

    fn five_point(points: [(f32, f32); 5]) -> LandmarkSet {
        LandmarkSet::new(
            points.iter().map(|&(x, y)| Landmark::new(x, y)).collect(),
            Topology::FIVE_POINT,
        )
    }

    #[test]
    fn fallback_for_1000_by_800() {
        let rect = locate_region(1000, 800, None, DEFAULT_PADDING, 0);
        assert_eq!(
            rect,
            RedactionRect {
                x_min: 100,
                y_min: 200,
                x_max: 900,
                y_max: 640
            }
        );
    }

    #[test]
    fn fallback_truncates() {
        // 0.1 * 15 = 1.5, 0.25 * 15 = 3.75, 0.9 * 15 = 13.5, 0.8 * 15 = 12
        let rect = fallback_rect(15, 15);
        assert_eq!((rect.x_min, rect.y_min, rect.x_max, rect.y_max), (1, 3, 13, 12));
    }

    #[test]
    fn fallback_on_single_pixel_image() {
        let rect = locate_region(1, 1, None, DEFAULT_PADDING, 0);
        assert_eq!((rect.x_min, rect.y_min, rect.x_max, rect.y_max), (0, 0, 0, 0));
    }

    #[test]
    fn clustered_landmarks_give_zero_sized_rect() {
        let rect = locate_region(1000, 800, Some(&clustered(0.5, 0.5)), 0.35, 0);
        assert_eq!(
            rect,
            RedactionRect {
                x_min: 500,
                y_min: 400,
                x_max: 500,
                y_max: 400
            }
        );
        assert_eq!(rect.pixel_width(), 1);
    }

    #[test]
    fn twelve_points_at_one_pixel() {
        let set = LandmarkSet::new(
            vec![Landmark::new(0.5, 0.5); 12],
            Topology {
                left_eye: &[0, 1, 2],
                right_eye: &[3, 4, 5],
                nose: &[6, 7, 8],
                mouth: &[9, 10, 11],
            },
        );
        let rect = locate_region(1000, 800, Some(&set), 0.35, 0);
        assert_eq!((rect.x_min, rect.y_min, rect.x_max, rect.y_max), (500, 400, 500, 400));
    }

    #[test]
    fn tight_box_is_padded() {
        // Points span 250..750 on both axes of a 1000x1000 image
        let set = five_point([
            (0.25, 0.25),
            (0.75, 0.25),
            (0.5, 0.5),
            (0.375, 0.75),
            (0.625, 0.75),
        ]);
        let rect = locate_region(1000, 1000, Some(&set), 0.25, 0);
        // 500 * 0.25 = 125 on each side
        assert_eq!(
            rect,
            RedactionRect {
                x_min: 125,
                y_min: 125,
                x_max: 875,
                y_max: 875
            }
        );
    }

    #[test]
    fn padding_is_clamped_to_image() {
        let set = five_point([(0.0, 0.0), (1.0, 0.0), (0.5, 0.5), (0.0, 1.0), (1.0, 1.0)]);
        let rect = locate_region(640, 480, Some(&set), 0.35, 0);
        assert_eq!(
            rect,
            RedactionRect {
                x_min: 0,
                y_min: 0,
                x_max: 639,
                y_max: 479
            }
        );
    }

    #[test]
    fn out_of_range_landmarks_are_clamped() {
        let set = five_point([(-0.2, -0.1), (1.3, 0.2), (0.5, 0.5), (0.4, 1.5), (0.6, 0.9)]);
        let rect = locate_region(200, 100, Some(&set), 0.0, 0);
        assert_eq!(
            rect,
            RedactionRect {
                x_min: 0,
                y_min: 0,
                x_max: 199,
                y_max: 99
            }
        );
    }

    #[test]
    fn unresolvable_indices_fall_back() {
        let set = LandmarkSet::new(vec![Landmark::new(0.5, 0.5); 10], Topology::FACE_MESH);
        // indices 0..10 contain 1, 2, 4, 5 from the nose group
        let rect = locate_region(100, 100, Some(&set), 0.35, 0);
        assert_eq!((rect.x_min, rect.y_min), (50, 50));

        let empty = LandmarkSet::new(Vec::new(), Topology::FACE_MESH);
        assert_eq!(
            locate_region(1000, 800, Some(&empty), 0.35, 0),
            fallback_rect(1000, 800)
        );
    }

    #[test]
    fn larger_padding_never_shrinks() {
        let set = five_point([(0.4, 0.35), (0.6, 0.36), (0.5, 0.5), (0.42, 0.6), (0.58, 0.61)]);
        let mut previous = locate_region(1000, 800, Some(&set), 0.0, 0);
        for step in 1..=20 {
            let pad = step as f32 * 0.05;
            let rect = locate_region(1000, 800, Some(&set), pad, 0);
            assert!(rect.x_min <= previous.x_min, "pad {pad}");
            assert!(rect.y_min <= previous.y_min, "pad {pad}");
            assert!(rect.x_max >= previous.x_max, "pad {pad}");
            assert!(rect.y_max >= previous.y_max, "pad {pad}");
            previous = rect;
        }
    }

    #[test]
    fn rect_stays_inside_image() {
        let sizes = [(1, 1), (3, 7), (640, 480), (1001, 333)];
        let coords = [-1.0, 0.0, 0.001, 0.5, 0.999, 1.0, 2.0];
        for &(w, h) in &sizes {
            for &x in &coords {
                for &y in &coords {
                    let set = five_point([(x, y), (1.0 - x, y), (0.5, 0.5), (x, 1.0 - y), (0.5, y)]);
                    for min_size in [0, 5, 5000] {
                        let rect = locate_region(w, h, Some(&set), 1.5, min_size);
                        assert!(rect.x_min <= rect.x_max && rect.x_max < w, "{rect:?} in {w}x{h}");
                        assert!(rect.y_min <= rect.y_max && rect.y_max < h, "{rect:?} in {w}x{h}");
                    }
                }
            }
        }
    }

    #[test]
    fn min_size_grows_degenerate_rect() {
        let rect = locate_region(1000, 800, Some(&clustered(0.5, 0.5)), 0.35, 40);
        assert_eq!(rect.pixel_width(), 40);
        assert_eq!(rect.pixel_height(), 40);
        assert!(rect.contains(500, 400));
    }

    #[test]
    fn min_size_shifts_inside_at_edges() {
        let rect = locate_region(100, 100, Some(&clustered(0.0, 0.999)), 0.35, 20);
        assert_eq!(
            rect,
            RedactionRect {
                x_min: 0,
                y_min: 80,
                x_max: 19,
                y_max: 99
            }
        );
    }

    #[test]
    fn min_size_is_capped_by_image() {
        let rect = locate_region(10, 6, Some(&clustered(0.5, 0.5)), 0.0, 50);
        assert_eq!(
            rect,
            RedactionRect {
                x_min: 0,
                y_min: 0,
                x_max: 9,
                y_max: 5
            }
        );
    }

    #[test]
    fn min_size_leaves_large_rects_alone() {
        let without = locate_region(1000, 800, None, 0.35, 0);
        let with = locate_region(1000, 800, None, 0.35, 10);
        assert_eq!(without, with);
    }

    #[test]
    fn negative_padding_gives_tight_box() {
        let points = [(100, 200), (300, 250)];
        for pad in [-0.5, -10.0, f32::NAN] {
            let rect = rect_from_points(&points, 1000, 800, pad).unwrap();
            assert_eq!(
                rect,
                RedactionRect {
                    x_min: 100,
                    y_min: 200,
                    x_max: 300,
                    y_max: 250
                },
                "{pad}"
            );
            assert!(rect.x_min <= rect.x_max && rect.y_min <= rect.y_max);
            assert_eq!(rect.pixel_width(), 201);
        }
    }

    #[test]
    fn zero_sized_image_gives_empty_rect() {
        let zero = RedactionRect {
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
        };
        let face = clustered(0.5, 0.5);
        for (w, h) in [(0, 0), (0, 10), (10, 0)] {
            assert_eq!(locate_region(w, h, None, 0.35, 0), zero, "{w}x{h}");
            assert_eq!(locate_region(w, h, Some(&face), 0.35, 0), zero, "{w}x{h}");
            assert_eq!(rect_from_points(&[(0, 0)], w, h, 0.35), None);
        }
    }

    #[test]
    fn contains_is_inclusive() {
        let rect = RedactionRect {
            x_min: 2,
            y_min: 3,
            x_max: 4,
            y_max: 3,
        };
        assert!(rect.contains(2, 3));
        assert!(rect.contains(4, 3));
        assert!(!rect.contains(5, 3));
        assert!(!rect.contains(3, 4));
    }
}

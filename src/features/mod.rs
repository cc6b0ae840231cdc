//! SIFT-class feature detection: difference-of-Gaussians keypoints with
//! 128-dimensional gradient-histogram descriptors.

mod descriptor;
mod pyramid;

use glam::Vec2;
use image::RgbImage;

pub const DESCRIPTOR_LEN: usize = 128;

/// A detected keypoint with its descriptor, in base-image coordinates.
#[derive(Debug, Clone)]
pub struct Feature {
    pub pt: Vec2,
    pub response: f32,
    pub descriptor: Vec<f32>,
}

/// Detection seam between the tracker and the scale-space machinery.
///
/// The pipeline uses [`SiftDetector`]; tests substitute deterministic fakes.
pub trait FeatureDetector {
    fn detect(&self, img: &RgbImage) -> Vec<Feature>;
}

/// Difference-of-Gaussians detector. Deterministic: no randomness anywhere,
/// keypoints are ordered by descending response (ties by position).
#[derive(Debug, Clone)]
pub struct SiftDetector {
    pub max_features: usize,
}

impl SiftDetector {
    pub fn new(max_features: usize) -> SiftDetector {
        SiftDetector { max_features }
    }
}

impl Default for SiftDetector {
    fn default() -> SiftDetector {
        SiftDetector { max_features: 500 }
    }
}

impl FeatureDetector for SiftDetector {
    fn detect(&self, img: &RgbImage) -> Vec<Feature> {
        let gray = pyramid::to_gray_f32(img);
        let space = pyramid::ScaleSpace::build(&gray);
        let mut points = space.detect_extrema();

        points.sort_by(|a, b| {
            b.response
                .total_cmp(&a.response)
                .then(a.octave.cmp(&b.octave))
                .then(a.y.total_cmp(&b.y))
                .then(a.x.total_cmp(&b.x))
        });
        points.truncate(self.max_features);

        points
            .iter()
            .filter_map(|sp| {
                let gauss = &space.octaves[sp.octave][sp.scale];
                let scale_factor = (1u32 << sp.octave) as f32;
                descriptor::describe(gauss, sp, scale_factor)
            })
            .collect()
    }
}

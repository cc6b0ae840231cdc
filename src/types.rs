use image::RgbImage;
use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 3x3 projective transform in homogeneous coordinates, row-major,
/// applied to points as `H * [x, y, 1]^T` followed by perspective divide.
pub type Homography = na::Matrix3<f64>;

/// Axis-aligned square crop region in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, side: u32) -> CropRect {
        CropRect {
            x,
            y,
            w: side,
            h: side,
        }
    }
}

/// Container-level properties carried from ingest through to export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub fps: i32,
    pub fourcc: i32,
    pub bitrate: f64,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
}

/// Tuning knobs for the stabilization pipeline.
///
/// `rng_seed` fully determines the RANSAC sampling: a fixed seed and
/// byte-identical input frames give byte-identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizeOptions {
    /// RANSAC iterations per frame pair.
    pub ransac_iters: usize,
    /// Inlier reprojection threshold in pixels.
    pub ransac_eps: f64,
    /// Symmetric smoothing window applied to the cumulative camera path.
    pub filter: Vec<f64>,
    /// Seed for the RANSAC sample draws.
    pub rng_seed: u64,
    /// Keep at most this many keypoints per frame, strongest response first.
    pub max_features: usize,
}

impl Default for StabilizeOptions {
    fn default() -> StabilizeOptions {
        StabilizeOptions {
            ransac_iters: 1000,
            ransac_eps: 10.0,
            filter: vec![0.1, 0.3, 0.5, 0.3, 0.1],
            rng_seed: 0,
            max_features: 500,
        }
    }
}

/// Result of a successful stabilization run.
///
/// `frames` are the warped frames cropped to `crop` (all square, side
/// `crop.w`). Non-fatal per-frame degradations are listed in `warnings`.
#[derive(Debug)]
pub struct Stabilized {
    pub frames: Vec<RgbImage>,
    pub crop: CropRect,
    pub metadata: VideoMetadata,
    pub warnings: Vec<CoreError>,
}

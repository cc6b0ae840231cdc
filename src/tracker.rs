//! Pairwise feature tracking: detect, cross-check match, RANSAC homography.

use glam::Vec2;
use image::RgbImage;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::features::{FeatureDetector, SiftDetector};
use crate::homography::{dlt_homography, h_apply};
use crate::matching::match_descriptors;
use crate::types::{Homography, StabilizeOptions};

const MIN_MATCHES: usize = 4;
const DET_EPSILON: f64 = 1e-8;

/// Why a pairwise track failed. The estimator maps these onto the error
/// taxonomy with the frame index attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackFailure {
    InsufficientFeatures,
    DegenerateHomography,
}

/// Estimates the homography mapping points of one frame into another.
pub struct FeatureTracker<D> {
    detector: D,
    ransac_iters: usize,
    ransac_eps: f64,
}

impl FeatureTracker<SiftDetector> {
    pub fn new(options: &StabilizeOptions) -> FeatureTracker<SiftDetector> {
        FeatureTracker::with_detector(SiftDetector::new(options.max_features), options)
    }
}

impl<D: FeatureDetector> FeatureTracker<D> {
    pub fn with_detector(detector: D, options: &StabilizeOptions) -> FeatureTracker<D> {
        FeatureTracker {
            detector,
            ransac_iters: options.ransac_iters,
            ransac_eps: options.ransac_eps,
        }
    }

    /// Returns H such that `h_apply(H, p) ~ q` for corresponding points
    /// `p` in `a` and `q` in `b`.
    pub fn track(
        &self,
        a: &RgbImage,
        b: &RgbImage,
        rng: &mut ChaCha8Rng,
    ) -> Result<Homography, TrackFailure> {
        let fa = self.detector.detect(a);
        let fb = self.detector.detect(b);
        if fa.len() < MIN_MATCHES || fb.len() < MIN_MATCHES {
            return Err(TrackFailure::InsufficientFeatures);
        }

        let matches = match_descriptors(&fa, &fb);
        if matches.len() < MIN_MATCHES {
            return Err(TrackFailure::InsufficientFeatures);
        }

        let src: Vec<Vec2> = matches.iter().map(|m| fa[m.query].pt).collect();
        let dst: Vec<Vec2> = matches.iter().map(|m| fb[m.train].pt).collect();

        let (best_h, best_inliers) = self.ransac(&src, &dst, rng)?;

        // Refit on the full best-inlier set; fall back to the RANSAC winner
        // if the least-squares system is degenerate.
        let inlier_src: Vec<Vec2> = best_inliers.iter().map(|&i| src[i]).collect();
        let inlier_dst: Vec<Vec2> = best_inliers.iter().map(|&i| dst[i]).collect();
        let h = dlt_homography(&inlier_src, &inlier_dst).unwrap_or(best_h);

        if !h.iter().all(|v| v.is_finite()) || h.determinant().abs() < DET_EPSILON {
            return Err(TrackFailure::DegenerateHomography);
        }
        Ok(h)
    }

    fn ransac(
        &self,
        src: &[Vec2],
        dst: &[Vec2],
        rng: &mut ChaCha8Rng,
    ) -> Result<(Homography, Vec<usize>), TrackFailure> {
        let mut best_h: Option<Homography> = None;
        let mut best_inliers: Vec<usize> = Vec::new();
        let mut best_residual = f64::INFINITY;

        for _ in 0..self.ransac_iters {
            let sample = draw_distinct(rng, src.len(), MIN_MATCHES);
            let s: Vec<Vec2> = sample.iter().map(|&i| src[i]).collect();
            let d: Vec<Vec2> = sample.iter().map(|&i| dst[i]).collect();
            let h = match dlt_homography(&s, &d) {
                Some(h) if h.iter().all(|v| v.is_finite()) => h,
                _ => continue,
            };

            let (inliers, residual) = self.score(&h, src, dst);
            if inliers.len() > best_inliers.len()
                || (inliers.len() == best_inliers.len() && residual < best_residual)
            {
                best_h = Some(h);
                best_inliers = inliers;
                best_residual = residual;
            }
        }

        match best_h {
            Some(h) if best_inliers.len() >= MIN_MATCHES => Ok((h, best_inliers)),
            _ => Err(TrackFailure::DegenerateHomography),
        }
    }

    /// Inlier indices under `h` and their total reprojection residual.
    fn score(&self, h: &Homography, src: &[Vec2], dst: &[Vec2]) -> (Vec<usize>, f64) {
        let mut inliers = Vec::new();
        let mut residual = 0.0;
        for (i, (&p, &q)) in src.iter().zip(dst.iter()).enumerate() {
            let r = h_apply(h, p);
            let dx = (q.x - r.x) as f64;
            let dy = (q.y - r.y) as f64;
            let err = (dx * dx + dy * dy).sqrt();
            if err < self.ransac_eps {
                inliers.push(i);
                residual += err;
            }
        }
        (inliers, residual)
    }
}

/// Draws `k` distinct indices from `0..n`, resampling on duplicates.
fn draw_distinct(rng: &mut ChaCha8Rng, n: usize, k: usize) -> Vec<usize> {
    let mut sample = Vec::with_capacity(k);
    while sample.len() < k {
        let idx = rng.random_range(0..n);
        if !sample.contains(&idx) {
            sample.push(idx);
        }
    }
    sample
}

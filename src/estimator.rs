//! Inter-frame motion estimation and the cumulative camera path.

use image::RgbImage;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::CoreError;
use crate::features::FeatureDetector;
use crate::tracker::{FeatureTracker, TrackFailure};
use crate::types::Homography;

/// Per-frame homographies and their cumulative products.
pub struct MotionPath {
    /// `h[0] = I`; `h[i]` maps frame i into frame i-1.
    pub h: Vec<Homography>,
    /// `h_tilde[i] = h_tilde[i-1] * h[i]`, the transform relative to frame 0.
    pub h_tilde: Vec<Homography>,
    /// Non-fatal per-pair failures, downgraded to identity.
    pub warnings: Vec<CoreError>,
}

pub struct MotionEstimator<D> {
    tracker: FeatureTracker<D>,
    seed: u64,
}

impl<D: FeatureDetector> MotionEstimator<D> {
    pub fn new(tracker: FeatureTracker<D>, seed: u64) -> MotionEstimator<D> {
        MotionEstimator { tracker, seed }
    }

    /// Tracks every adjacent frame pair. A failed pair degrades to the
    /// identity transform and is recorded, so one bad pair cannot abort the
    /// job. Returns `Cancelled` if the token fires between pairs.
    pub fn estimate(
        &self,
        frames: &[RgbImage],
        progress: &mut dyn FnMut(f64),
        cancel: &dyn Fn() -> bool,
    ) -> Result<MotionPath, CoreError> {
        let n = frames.len();
        let mut h = Vec::with_capacity(n);
        let mut warnings = Vec::new();
        h.push(Homography::identity());

        for i in 1..n {
            if cancel() {
                return Err(CoreError::Cancelled);
            }
            // Per-pair RNG stream so results do not depend on evaluation
            // order.
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ i as u64);
            let h_i = match self.tracker.track(&frames[i], &frames[i - 1], &mut rng) {
                Ok(h_i) => h_i,
                Err(failure) => {
                    let warning = match failure {
                        TrackFailure::InsufficientFeatures => CoreError::InsufficientFeatures(i),
                        TrackFailure::DegenerateHomography => CoreError::DegenerateHomography(i),
                    };
                    log::warn!("frame pair ({}, {}): {}", i - 1, i, warning);
                    warnings.push(warning);
                    Homography::identity()
                }
            };
            h.push(h_i);
            progress(i as f64 / (n - 1) as f64);
        }

        let mut h_tilde = Vec::with_capacity(n);
        h_tilde.push(h[0]);
        for i in 1..n {
            let cumulative = h_tilde[i - 1] * h[i];
            h_tilde.push(cumulative);
        }

        Ok(MotionPath {
            h,
            h_tilde,
            warnings,
        })
    }
}

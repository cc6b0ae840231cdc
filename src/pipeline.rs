//! The stabilization pipeline: estimate, smooth, update, warp, crop.

use image::RgbImage;

use crate::crop::{and_mask, apply_crop, solve_crop};
use crate::error::CoreError;
use crate::estimator::MotionEstimator;
use crate::features::{FeatureDetector, SiftDetector};
use crate::smoothing::smooth_path;
use crate::tracker::FeatureTracker;
use crate::types::{Stabilized, StabilizeOptions, VideoMetadata};
use crate::warp::{compute_updates, support_mask, warp_frame};

pub const STAGE_ESTIMATING_MOTION: &str = "estimating_motion";
pub const STAGE_SMOOTHING: &str = "smoothing";
pub const STAGE_COMPUTING_UPDATES: &str = "computing_updates";
pub const STAGE_WARPING: &str = "warping";
pub const STAGE_CROPPING: &str = "cropping";

/// Stabilizes `frames` with the default SIFT-class detector.
///
/// `progress` receives `(stage_name, fraction)` events; `cancel` is polled
/// between frames and between stages and aborts the run with
/// [`CoreError::Cancelled`], returning no partial output.
pub fn stabilize(
    frames: &[RgbImage],
    metadata: &VideoMetadata,
    options: &StabilizeOptions,
    progress: &mut dyn FnMut(&str, f64),
    cancel: &dyn Fn() -> bool,
) -> Result<Stabilized, CoreError> {
    let detector = SiftDetector::new(options.max_features);
    stabilize_with_detector(frames, metadata, options, detector, progress, cancel)
}

/// Same pipeline with an injected feature detector, the seam tests use to
/// substitute deterministic fakes.
pub fn stabilize_with_detector<D: FeatureDetector>(
    frames: &[RgbImage],
    metadata: &VideoMetadata,
    options: &StabilizeOptions,
    detector: D,
    progress: &mut dyn FnMut(&str, f64),
    cancel: &dyn Fn() -> bool,
) -> Result<Stabilized, CoreError> {
    let n = frames.len();
    if n < 2 {
        return Err(CoreError::EmptySequence(n));
    }
    let (w, h) = frames[0].dimensions();
    for (i, frame) in frames.iter().enumerate() {
        let (fw, fh) = frame.dimensions();
        if (fw, fh) != (w, h) {
            return Err(CoreError::InconsistentFrameSize {
                index: i,
                got_w: fw,
                got_h: fh,
                want_w: w,
                want_h: h,
            });
        }
    }

    let mut warnings = Vec::new();

    progress(STAGE_ESTIMATING_MOTION, 0.0);
    let tracker = FeatureTracker::with_detector(detector, options);
    let estimator = MotionEstimator::new(tracker, options.rng_seed);
    let path = {
        let mut stage_progress = |fraction: f64| progress(STAGE_ESTIMATING_MOTION, fraction);
        estimator.estimate(frames, &mut stage_progress, cancel)?
    };
    warnings.extend(path.warnings);

    if cancel() {
        return Err(CoreError::Cancelled);
    }
    progress(STAGE_SMOOTHING, 0.0);
    let h_prime = smooth_path(&path.h_tilde, &options.filter);
    progress(STAGE_SMOOTHING, 1.0);

    if cancel() {
        return Err(CoreError::Cancelled);
    }
    progress(STAGE_COMPUTING_UPDATES, 0.0);
    let (updates, update_warnings) = compute_updates(&path.h_tilde, &h_prime);
    warnings.extend(update_warnings);
    progress(STAGE_COMPUTING_UPDATES, 1.0);

    if cancel() {
        return Err(CoreError::Cancelled);
    }
    progress(STAGE_WARPING, 0.0);
    let mut warped = Vec::with_capacity(n);
    for (i, frame) in frames.iter().enumerate() {
        if cancel() {
            return Err(CoreError::Cancelled);
        }
        warped.push(warp_frame(frame, &updates[i]));
        progress(STAGE_WARPING, (i + 1) as f64 / n as f64);
    }

    progress(STAGE_CROPPING, 0.0);
    let mut mask = vec![1u8; (w * h) as usize];
    for (i, update) in updates.iter().enumerate() {
        if cancel() {
            return Err(CoreError::Cancelled);
        }
        and_mask(&mut mask, &support_mask(update, w, h));
        progress(STAGE_CROPPING, (i + 1) as f64 / n as f64);
    }
    let crop = solve_crop(&mask, w, h)?;
    let cropped = apply_crop(&warped, &crop);

    Ok(Stabilized {
        frames: cropped,
        crop,
        metadata: VideoMetadata {
            width: crop.w,
            height: crop.h,
            frame_count: n,
            ..*metadata
        },
        warnings,
    })
}

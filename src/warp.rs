//! Update transforms and perspective warping.

use image::{Rgb, RgbImage};
use nalgebra as na;

use crate::error::CoreError;
use crate::types::Homography;

const DET_EPSILON: f64 = 1e-8;

/// `U[i] = inverse(h_prime[i]) * h_tilde[i]` — the warp that cancels the
/// difference between the actual and the smoothed camera path. A smoothed
/// matrix that is not invertible downgrades to the identity and is recorded.
pub fn compute_updates(
    h_tilde: &[Homography],
    h_prime: &[Homography],
) -> (Vec<Homography>, Vec<CoreError>) {
    let mut updates = Vec::with_capacity(h_tilde.len());
    let mut warnings = Vec::new();
    for (i, (cumulative, smoothed)) in h_tilde.iter().zip(h_prime.iter()).enumerate() {
        let update = if smoothed.determinant().abs() < DET_EPSILON {
            None
        } else {
            smoothed.try_inverse().map(|inv| inv * cumulative)
        };
        match update {
            Some(u) => updates.push(u),
            None => {
                log::warn!("smoothed path matrix {} is singular, using identity", i);
                warnings.push(CoreError::DegenerateSmoothedMatrix(i));
                updates.push(Homography::identity());
            }
        }
    }
    (updates, warnings)
}

/// Warps `frame` by `u` with inverse-map semantics: every output pixel x'
/// samples the input at `u^-1 * x'`, bilinearly, with black fill outside the
/// source. Output size equals input size.
pub fn warp_frame(frame: &RgbImage, u: &Homography) -> RgbImage {
    let (w, h) = frame.dimensions();
    let inv = match u.try_inverse() {
        Some(inv) => inv,
        None => return RgbImage::new(w, h),
    };
    RgbImage::from_par_fn(w, h, |x, y| {
        match source_coords(&inv, x, y) {
            Some((sx, sy)) => bilinear(frame, sx, sy),
            None => Rgb([0, 0, 0]),
        }
    })
}

/// Binary support mask of the warp: 1 where the output pixel is sourced
/// from inside the original frame, 0 where the fill shows through.
/// Row-major, `w * h` entries.
///
/// Matches warping an all-ones image with the same bilinear sampling and
/// rounding the result, so a source location hugging the border by a
/// sub-pixel amount still counts as covered.
pub fn support_mask(u: &Homography, w: u32, h: u32) -> Vec<u8> {
    let inv = match u.try_inverse() {
        Some(inv) => inv,
        None => return vec![0; (w * h) as usize],
    };
    let mut mask = vec![0u8; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            if let Some((sx, sy)) = source_coords(&inv, x, y) {
                let coverage = axis_coverage(sx, w) * axis_coverage(sy, h);
                if coverage >= 0.5 {
                    mask[(y * w + x) as usize] = 1;
                }
            }
        }
    }
    mask
}

/// Bilinear weight an indicator image contributes along one axis for a
/// sample at `s`: 1 inside `[0, n-1]`, tapering linearly to 0 one pixel
/// outside.
#[inline]
fn axis_coverage(s: f64, n: u32) -> f64 {
    let last = (n - 1) as f64;
    if s < 0.0 {
        (1.0 + s).max(0.0)
    } else if s > last {
        (1.0 - (s - last)).max(0.0)
    } else {
        1.0
    }
}

#[inline]
fn source_coords(inv: &Homography, x: u32, y: u32) -> Option<(f64, f64)> {
    let v = inv * na::Vector3::new(x as f64, y as f64, 1.0);
    if v.z.abs() < 1e-12 {
        return None;
    }
    Some((v.x / v.z, v.y / v.z))
}

/// Bilinear sample with constant black fill: taps outside the source read
/// as zero, so samples in the one-pixel band around the border blend into
/// the fill instead of cutting off hard.
fn bilinear(img: &RgbImage, sx: f64, sy: f64) -> Rgb<u8> {
    let (w, h) = img.dimensions();
    if sx <= -1.0 || sy <= -1.0 || sx >= w as f64 || sy >= h as f64 {
        return Rgb([0, 0, 0]);
    }
    let x0 = sx.floor() as i64;
    let y0 = sy.floor() as i64;
    let wx = sx - x0 as f64;
    let wy = sy - y0 as f64;

    let tap = |x: i64, y: i64, c: usize| -> f64 {
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            0.0
        } else {
            img.get_pixel(x as u32, y as u32)[c] as f64
        }
    };

    let mut out = [0u8; 3];
    for (c, v) in out.iter_mut().enumerate() {
        let top = (1.0 - wx) * tap(x0, y0, c) + wx * tap(x0 + 1, y0, c);
        let bottom = (1.0 - wx) * tap(x0, y0 + 1, c) + wx * tap(x0 + 1, y0 + 1, c);
        *v = ((1.0 - wy) * top + wy * bottom).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

//! Common-support crop: largest axis-aligned square valid in every frame.

use crate::error::CoreError;
use crate::types::CropRect;

/// ANDs `mask` into the accumulator, in place.
pub fn and_mask(acc: &mut [u8], mask: &[u8]) {
    for (a, &m) in acc.iter_mut().zip(mask.iter()) {
        *a &= m;
    }
}

/// Finds the largest axis-aligned square of set pixels in the common
/// support mask (`w * h`, row-major).
///
/// The mask is first trimmed to the `min(w, h)` square at the origin, then
/// scanned with the classic bottom-up dynamic program. Among equal maxima
/// the first cell in row-major order wins. The trim is a plain sub-view of
/// the same pixel grid, so the winning square needs no coordinate rescaling
/// to apply to the full-size mask.
pub fn solve_crop(mask: &[u8], w: u32, h: u32) -> Result<CropRect, CoreError> {
    let side = w.min(h) as usize;
    let stride = w as usize;
    let n = side;

    let mut s = vec![0u32; n * n];
    for r in (0..n).rev() {
        for c in (0..n).rev() {
            if mask[r * stride + c] == 0 {
                continue;
            }
            s[r * n + c] = if r == n - 1 || c == n - 1 {
                1
            } else {
                1 + s[(r + 1) * n + c]
                    .min(s[r * n + c + 1])
                    .min(s[(r + 1) * n + c + 1])
            };
        }
    }

    let mut best = 0u32;
    let mut best_rc = (0usize, 0usize);
    for r in 0..n {
        for c in 0..n {
            if s[r * n + c] > best {
                best = s[r * n + c];
                best_rc = (r, c);
            }
        }
    }

    if best == 0 {
        return Err(CoreError::EmptyCommonSupport);
    }
    Ok(CropRect::new(best_rc.1 as u32, best_rc.0 as u32, best))
}

/// Extracts the crop from each warped frame.
pub fn apply_crop(frames: &[image::RgbImage], crop: &CropRect) -> Vec<image::RgbImage> {
    frames
        .iter()
        .map(|f| image::imageops::crop_imm(f, crop.x, crop.y, crop.w, crop.h).to_image())
        .collect()
}

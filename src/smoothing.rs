//! Camera-path smoothing by a clipped symmetric weighted average.

use crate::types::Homography;

/// Smooths the cumulative path with the window `weights` centered on each
/// index. Near the sequence ends the window is clipped and the weight sum
/// renormalized, so the boundary frames average only over what exists
/// instead of being dragged toward zero.
///
/// The result is an elementwise average and need not be a projective
/// transform itself; it is only ever used through its inverse composed with
/// the raw path.
pub fn smooth_path(h_tilde: &[Homography], weights: &[f64]) -> Vec<Homography> {
    let n = h_tilde.len();
    let radius = weights.len() / 2;
    let mut out = Vec::with_capacity(n);

    for i in 0..n {
        let mut acc = Homography::zeros();
        let mut z = 0.0;
        for (j, &w) in weights.iter().enumerate() {
            let idx = i as isize + j as isize - radius as isize;
            if idx < 0 || idx >= n as isize {
                continue;
            }
            acc += h_tilde[idx as usize] * w;
            z += w;
        }
        out.push(acc / z);
    }
    out
}

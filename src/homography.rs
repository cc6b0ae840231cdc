//! Direct linear transform homography fits.

use glam::Vec2;
use nalgebra as na;

use crate::types::Homography;

/// Projects `p` through `h` and dehomogenizes.
pub fn h_apply(h: &Homography, p: Vec2) -> Vec2 {
    let v = h * na::Vector3::new(p.x as f64, p.y as f64, 1.0);
    Vec2::new((v.x / v.z) as f32, (v.y / v.z) as f32)
}

/// Hartley normalization: translate to the centroid, scale so the mean
/// distance from it is sqrt(2). Returns the conditioned points and the
/// normalizing transform.
fn normalize_points(pts: &[Vec2]) -> (Vec<na::Vector2<f64>>, na::Matrix3<f64>) {
    let n = pts.len() as f64;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for p in pts {
        cx += p.x as f64;
        cy += p.y as f64;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0;
    for p in pts {
        let dx = p.x as f64 - cx;
        let dy = p.y as f64 - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;
    let s = if mean_dist > 1e-12 {
        2f64.sqrt() / mean_dist
    } else {
        1.0
    };

    let t = na::Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let conditioned = pts
        .iter()
        .map(|p| {
            let v = t * na::Vector3::new(p.x as f64, p.y as f64, 1.0);
            na::Vector2::new(v.x, v.y)
        })
        .collect();
    (conditioned, t)
}

/// Least-squares DLT: finds H with `dst ~ H * src` from `n >= 4`
/// correspondences. With exactly 4 points this is the minimal solve used
/// inside RANSAC; with more it is the refit over an inlier set.
///
/// Returns `None` when the correspondences do not determine a homography
/// (rank-deficient system or vanishing scale).
pub fn dlt_homography(src: &[Vec2], dst: &[Vec2]) -> Option<Homography> {
    if src.len() != dst.len() || src.len() < 4 {
        return None;
    }

    let (s, ts) = normalize_points(src);
    let (d, td) = normalize_points(dst);

    let n = src.len();
    // Padded to at least 9 rows so the thin SVD always carries the full set
    // of right singular vectors, nullspace included.
    let mut a = na::DMatrix::<f64>::zeros((2 * n).max(9), 9);
    for k in 0..n {
        let x = s[k].x;
        let y = s[k].y;
        let u = d[k].x;
        let v = d[k].y;

        a[(2 * k, 0)] = -x;
        a[(2 * k, 1)] = -y;
        a[(2 * k, 2)] = -1.0;
        a[(2 * k, 6)] = u * x;
        a[(2 * k, 7)] = u * y;
        a[(2 * k, 8)] = u;

        a[(2 * k + 1, 3)] = -x;
        a[(2 * k + 1, 4)] = -y;
        a[(2 * k + 1, 5)] = -1.0;
        a[(2 * k + 1, 6)] = v * x;
        a[(2 * k + 1, 7)] = v * y;
        a[(2 * k + 1, 8)] = v;
    }

    // h is the right singular vector of the smallest singular value.
    let svd = a.svd(false, true);
    let vt = svd.v_t?;
    let mut min_idx = 0;
    for i in 1..svd.singular_values.len() {
        if svd.singular_values[i] < svd.singular_values[min_idx] {
            min_idx = i;
        }
    }
    let hv = vt.row(min_idx);
    let hn = na::Matrix3::from_row_slice(&[
        hv[0], hv[1], hv[2], hv[3], hv[4], hv[5], hv[6], hv[7], hv[8],
    ]);

    let h = td.try_inverse()? * hn * ts;
    let scale = h[(2, 2)];
    if scale.abs() < 1e-12 {
        return None;
    }
    Some(h / scale)
}

//! Orientation assignment and 128-dimensional gradient descriptors.

use std::f32::consts::TAU;

use glam::Vec2;

use super::pyramid::{GrayF, ScalePoint};
use super::{Feature, DESCRIPTOR_LEN};

const ORI_BINS: usize = 36;
/// Spatial grid of the descriptor: 4x4 cells x 8 orientation bins = 128.
const DESC_WIDTH: usize = 4;
const DESC_ORI_BINS: usize = 8;
/// Per-component clamp applied before renormalization.
const DESC_CLAMP: f32 = 0.2;

pub(crate) fn describe(gauss: &GrayF, sp: &ScalePoint, scale_factor: f32) -> Option<Feature> {
    let ori = dominant_orientation(gauss, sp)?;
    let descriptor = gradient_descriptor(gauss, sp, ori)?;
    Some(Feature {
        pt: Vec2::new(sp.x * scale_factor, sp.y * scale_factor),
        response: sp.response,
        descriptor,
    })
}

#[inline]
fn gradient(img: &GrayF, x: i32, y: i32) -> (f32, f32) {
    let v = |x: i32, y: i32| img.get_pixel(x as u32, y as u32)[0];
    (v(x + 1, y) - v(x - 1, y), v(x, y + 1) - v(x, y - 1))
}

/// Peak of the Gaussian-weighted gradient orientation histogram around the
/// keypoint, refined by parabolic interpolation over the winning bin.
fn dominant_orientation(gauss: &GrayF, sp: &ScalePoint) -> Option<f32> {
    let (w, h) = (gauss.width() as i32, gauss.height() as i32);
    let (xi, yi) = (sp.x.round() as i32, sp.y.round() as i32);
    let sigma_w = 1.5 * sp.sigma;
    let radius = (3.0 * sigma_w).round() as i32;
    let denom = 2.0 * sigma_w * sigma_w;

    let mut hist = [0f32; ORI_BINS];
    for dy in -radius..=radius {
        let y = yi + dy;
        if y < 1 || y >= h - 1 {
            continue;
        }
        for dx in -radius..=radius {
            let x = xi + dx;
            if x < 1 || x >= w - 1 {
                continue;
            }
            let (gx, gy) = gradient(gauss, x, y);
            let mag = (gx * gx + gy * gy).sqrt();
            let ang = gy.atan2(gx).rem_euclid(TAU);
            let weight = (-((dx * dx + dy * dy) as f32) / denom).exp();
            let bin = ((ang / TAU * ORI_BINS as f32).floor() as usize) % ORI_BINS;
            hist[bin] += weight * mag;
        }
    }

    // Circular [1, 1, 1]/3 smoothing, two passes.
    for _ in 0..2 {
        let prev = hist;
        for b in 0..ORI_BINS {
            hist[b] = (prev[(b + ORI_BINS - 1) % ORI_BINS] + prev[b] + prev[(b + 1) % ORI_BINS])
                / 3.0;
        }
    }

    let (best, &peak) = hist
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1).then(b.0.cmp(&a.0)))?;
    if peak <= 0.0 {
        return None;
    }
    let left = hist[(best + ORI_BINS - 1) % ORI_BINS];
    let right = hist[(best + 1) % ORI_BINS];
    let denom = left - 2.0 * peak + right;
    let offset = if denom.abs() > 1e-12 {
        (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
    } else {
        0.0
    };
    Some(((best as f32 + 0.5 + offset) * (TAU / ORI_BINS as f32)).rem_euclid(TAU))
}

/// 4x4x8 gradient histogram over a rotated, scale-normalized window, with
/// trilinear scattering and the usual clamp-and-renormalize.
fn gradient_descriptor(gauss: &GrayF, sp: &ScalePoint, ori: f32) -> Option<Vec<f32>> {
    let (w, h) = (gauss.width() as i32, gauss.height() as i32);
    let (xi, yi) = (sp.x.round() as i32, sp.y.round() as i32);
    let hist_width = 3.0 * sp.sigma;
    let radius = (hist_width * std::f32::consts::SQRT_2 * (DESC_WIDTH as f32 + 1.0) * 0.5)
        .round() as i32;
    let cos_t = ori.cos() / hist_width;
    let sin_t = ori.sin() / hist_width;
    let exp_scale = -2.0 / (DESC_WIDTH * DESC_WIDTH) as f32;
    let half = DESC_WIDTH as f32 / 2.0;

    let mut desc = vec![0f32; DESCRIPTOR_LEN];
    for i in -radius..=radius {
        for j in -radius..=radius {
            let c_rot = j as f32 * cos_t - i as f32 * sin_t;
            let r_rot = j as f32 * sin_t + i as f32 * cos_t;
            let rbin = r_rot + half - 0.5;
            let cbin = c_rot + half - 0.5;
            if rbin <= -1.0 || rbin >= DESC_WIDTH as f32 || cbin <= -1.0
                || cbin >= DESC_WIDTH as f32
            {
                continue;
            }
            let x = xi + j;
            let y = yi + i;
            if x < 1 || x >= w - 1 || y < 1 || y >= h - 1 {
                continue;
            }

            let (gx, gy) = gradient(gauss, x, y);
            let mag = (gx * gx + gy * gy).sqrt();
            let ang = (gy.atan2(gx) - ori).rem_euclid(TAU);
            let obin = ang / TAU * DESC_ORI_BINS as f32;
            let weight = ((c_rot * c_rot + r_rot * r_rot) * exp_scale).exp() * mag;

            scatter(&mut desc, rbin, cbin, obin, weight);
        }
    }

    let norm = desc.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm < 1e-6 {
        return None;
    }
    let threshold = norm * DESC_CLAMP;
    for v in desc.iter_mut() {
        *v = v.min(threshold);
    }
    let norm = desc.iter().map(|v| v * v).sum::<f32>().sqrt().max(1e-6);
    for v in desc.iter_mut() {
        *v /= norm;
    }
    Some(desc)
}

/// Trilinear scatter of one weighted sample into the (row, col, orientation)
/// histogram grid.
fn scatter(desc: &mut [f32], rbin: f32, cbin: f32, obin: f32, weight: f32) {
    let r0 = rbin.floor();
    let c0 = cbin.floor();
    let o0 = obin.floor();
    let dr = rbin - r0;
    let dc = cbin - c0;
    let do_ = obin - o0;

    for (ri, rw) in [(r0 as i32, 1.0 - dr), (r0 as i32 + 1, dr)] {
        if ri < 0 || ri >= DESC_WIDTH as i32 {
            continue;
        }
        for (ci, cw) in [(c0 as i32, 1.0 - dc), (c0 as i32 + 1, dc)] {
            if ci < 0 || ci >= DESC_WIDTH as i32 {
                continue;
            }
            for (oi, ow) in [(o0 as i32, 1.0 - do_), (o0 as i32 + 1, do_)] {
                let o = oi.rem_euclid(DESC_ORI_BINS as i32) as usize;
                let idx = (ri as usize * DESC_WIDTH + ci as usize) * DESC_ORI_BINS + o;
                desc[idx] += weight * rw * cw * ow;
            }
        }
    }
}

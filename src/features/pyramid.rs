//! Gaussian scale space and difference-of-Gaussians extrema detection.

use image::{ImageBuffer, Luma, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use nalgebra as na;

pub(crate) type GrayF = ImageBuffer<Luma<f32>, Vec<f32>>;

const SCALES_PER_OCTAVE: usize = 3;
/// Blur level of the first image in each octave.
const SIGMA_BASE: f32 = 1.6;
/// Assumed blur of the input frame.
const SIGMA_INPUT: f32 = 0.5;
/// Threshold on interpolated |DoG| response, in [0, 1] intensity units.
const CONTRAST_THRESHOLD: f32 = 0.013;
/// Principal curvature ratio bound for edge rejection.
const EDGE_RATIO: f32 = 10.0;
const MIN_OCTAVE_SIZE: u32 = 16;
const MAX_OCTAVES: usize = 4;

/// Keypoint candidate in octave-local coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScalePoint {
    pub x: f32,
    pub y: f32,
    pub octave: usize,
    /// Gaussian layer the orientation/descriptor are sampled from.
    pub scale: usize,
    /// Blur level of that layer, in octave-local pixels.
    pub sigma: f32,
    pub response: f32,
}

pub(crate) fn to_gray_f32(img: &RgbImage) -> GrayF {
    GrayF::from_fn(img.width(), img.height(), |x, y| {
        let p = img.get_pixel(x, y);
        let luma = 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32;
        Luma([luma / 255.0])
    })
}

/// Decimate by dropping every second row and column.
fn half_size(img: &GrayF) -> GrayF {
    GrayF::from_fn(img.width() / 2, img.height() / 2, |x, y| {
        *img.get_pixel(2 * x, 2 * y)
    })
}

fn subtract(a: &GrayF, b: &GrayF) -> GrayF {
    GrayF::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y)[0] - b.get_pixel(x, y)[0]])
    })
}

pub(crate) struct ScaleSpace {
    /// Gaussian images per octave, `SCALES_PER_OCTAVE + 3` layers each.
    pub octaves: Vec<Vec<GrayF>>,
}

impl ScaleSpace {
    pub fn build(gray: &GrayF) -> ScaleSpace {
        let k = 2f32.powf(1.0 / SCALES_PER_OCTAVE as f32);
        let sigmas: Vec<f32> = (0..SCALES_PER_OCTAVE + 3)
            .map(|i| SIGMA_BASE * k.powi(i as i32))
            .collect();

        let mut octaves = Vec::new();
        let mut base = gaussian_blur_f32(
            gray,
            (SIGMA_BASE * SIGMA_BASE - SIGMA_INPUT * SIGMA_INPUT).sqrt(),
        );
        loop {
            let mut layers = Vec::with_capacity(sigmas.len());
            layers.push(base.clone());
            for i in 1..sigmas.len() {
                let delta = (sigmas[i] * sigmas[i] - sigmas[i - 1] * sigmas[i - 1]).sqrt();
                let blurred = gaussian_blur_f32(&layers[i - 1], delta);
                layers.push(blurred);
            }
            // The layer at index SCALES_PER_OCTAVE carries blur 2 * SIGMA_BASE
            // and seeds the next octave after decimation.
            let next = half_size(&layers[SCALES_PER_OCTAVE]);
            octaves.push(layers);

            if octaves.len() >= MAX_OCTAVES
                || next.width() < MIN_OCTAVE_SIZE
                || next.height() < MIN_OCTAVE_SIZE
            {
                break;
            }
            base = next;
        }
        ScaleSpace { octaves }
    }

    pub fn detect_extrema(&self) -> Vec<ScalePoint> {
        let k = 2f32.powf(1.0 / SCALES_PER_OCTAVE as f32);
        let mut out = Vec::new();
        for (o, layers) in self.octaves.iter().enumerate() {
            let dogs: Vec<GrayF> = (0..layers.len() - 1)
                .map(|i| subtract(&layers[i + 1], &layers[i]))
                .collect();
            let (w, h) = (dogs[0].width() as i32, dogs[0].height() as i32);

            for s in 1..dogs.len() - 1 {
                for y in 1..h - 1 {
                    for x in 1..w - 1 {
                        let v = at(&dogs[s], x, y);
                        if v.abs() <= 0.5 * CONTRAST_THRESHOLD {
                            continue;
                        }
                        if !is_extremum(&dogs, s, x, y, v) || is_edge_like(&dogs[s], x, y) {
                            continue;
                        }
                        let (ox, oy, contrast) = refine(&dogs, s, x, y).unwrap_or((0.0, 0.0, v));
                        if contrast.abs() < CONTRAST_THRESHOLD {
                            continue;
                        }
                        out.push(ScalePoint {
                            x: x as f32 + ox,
                            y: y as f32 + oy,
                            octave: o,
                            scale: s,
                            sigma: SIGMA_BASE * k.powi(s as i32),
                            response: contrast.abs(),
                        });
                    }
                }
            }
        }
        out
    }
}

#[inline]
fn at(img: &GrayF, x: i32, y: i32) -> f32 {
    img.get_pixel(x as u32, y as u32)[0]
}

/// Strict extremum over the 26 scale-space neighbors.
fn is_extremum(dogs: &[GrayF], s: usize, x: i32, y: i32, v: f32) -> bool {
    let maximum = v > 0.0;
    for ds in -1i32..=1 {
        let layer = &dogs[(s as i32 + ds) as usize];
        for dy in -1..=1 {
            for dx in -1..=1 {
                if ds == 0 && dx == 0 && dy == 0 {
                    continue;
                }
                let n = at(layer, x + dx, y + dy);
                if (maximum && n >= v) || (!maximum && n <= v) {
                    return false;
                }
            }
        }
    }
    true
}

/// Reject responses whose principal curvature ratio exceeds `EDGE_RATIO`.
fn is_edge_like(dog: &GrayF, x: i32, y: i32) -> bool {
    let v = at(dog, x, y);
    let dxx = at(dog, x + 1, y) + at(dog, x - 1, y) - 2.0 * v;
    let dyy = at(dog, x, y + 1) + at(dog, x, y - 1) - 2.0 * v;
    let dxy = 0.25
        * (at(dog, x + 1, y + 1) - at(dog, x + 1, y - 1) - at(dog, x - 1, y + 1)
            + at(dog, x - 1, y - 1));
    let trace = dxx + dyy;
    let det = dxx * dyy - dxy * dxy;
    let bound = (EDGE_RATIO + 1.0) * (EDGE_RATIO + 1.0) / EDGE_RATIO;
    det <= 0.0 || trace * trace / det >= bound
}

/// One-step quadratic interpolation of the extremum location. Returns the
/// spatial offset (clamped to half a pixel) and the interpolated contrast.
fn refine(dogs: &[GrayF], s: usize, x: i32, y: i32) -> Option<(f32, f32, f32)> {
    let d = |ds: i32, dx: i32, dy: i32| at(&dogs[(s as i32 + ds) as usize], x + dx, y + dy);
    let v = d(0, 0, 0);

    let gx = 0.5 * (d(0, 1, 0) - d(0, -1, 0));
    let gy = 0.5 * (d(0, 0, 1) - d(0, 0, -1));
    let gs = 0.5 * (d(1, 0, 0) - d(-1, 0, 0));

    let hxx = d(0, 1, 0) + d(0, -1, 0) - 2.0 * v;
    let hyy = d(0, 0, 1) + d(0, 0, -1) - 2.0 * v;
    let hss = d(1, 0, 0) + d(-1, 0, 0) - 2.0 * v;
    let hxy = 0.25 * (d(0, 1, 1) - d(0, 1, -1) - d(0, -1, 1) + d(0, -1, -1));
    let hxs = 0.25 * (d(1, 1, 0) - d(1, -1, 0) - d(-1, 1, 0) + d(-1, -1, 0));
    let hys = 0.25 * (d(1, 0, 1) - d(1, 0, -1) - d(-1, 0, 1) + d(-1, 0, -1));

    let hessian = na::Matrix3::new(hxx, hxy, hxs, hxy, hyy, hys, hxs, hys, hss);
    let grad = na::Vector3::new(gx, gy, gs);
    let offset = hessian.lu().solve(&(-grad))?;
    if offset.iter().any(|c| c.abs() > 1.0) {
        return None;
    }
    let contrast = v + 0.5 * grad.dot(&offset);
    let ox = offset[0].clamp(-0.5, 0.5);
    let oy = offset[1].clamp(-0.5, 0.5);
    Some((ox, oy, contrast))
}

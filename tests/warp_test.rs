use nalgebra as na;
use image::{Rgb, RgbImage};
use video_stabilizer::error::CoreError;
use video_stabilizer::smoothing::smooth_path;
use video_stabilizer::warp::{compute_updates, support_mask, warp_frame};
use video_stabilizer::Homography;

fn translation(tx: f64, ty: f64) -> Homography {
    na::Matrix3::new(
        1.0, 0.0, tx, //
        0.0, 1.0, ty, //
        0.0, 0.0, 1.0,
    )
}

fn checkerboard(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        if ((x / 8) + (y / 8)) % 2 == 0 {
            Rgb([40, 90, 200])
        } else {
            Rgb([220, 180, 30])
        }
    })
}

#[test]
fn test_identity_warp_is_pixel_identical() {
    let frame = checkerboard(64, 48);
    let warped = warp_frame(&frame, &Homography::identity());
    assert_eq!(warped.dimensions(), frame.dimensions());
    assert_eq!(warped.as_raw(), frame.as_raw());
}

#[test]
fn test_integer_translation_moves_pixels_exactly() {
    let frame = checkerboard(64, 64);
    let u = translation(3.0, 2.0);
    let warped = warp_frame(&frame, &u);

    // Inverse-map semantics: output (x, y) samples input (x - 3, y - 2).
    for y in 2..64u32 {
        for x in 3..64u32 {
            assert_eq!(warped.get_pixel(x, y), frame.get_pixel(x - 3, y - 2));
        }
    }
    // Pixels with no source are black fill.
    assert_eq!(*warped.get_pixel(0, 0), Rgb([0, 0, 0]));
    assert_eq!(*warped.get_pixel(2, 30), Rgb([0, 0, 0]));
}

#[test]
fn test_support_mask_of_translation() {
    let u = translation(3.0, 2.0);
    let mask = support_mask(&u, 20, 10);

    let at = |x: u32, y: u32| mask[(y * 20 + x) as usize];
    assert_eq!(at(2, 5), 0);
    assert_eq!(at(3, 5), 1);
    assert_eq!(at(19, 9), 1);
    assert_eq!(at(10, 1), 0);
    assert_eq!(at(10, 2), 1);

    let count: u32 = mask.iter().map(|&m| m as u32).sum();
    assert_eq!(count, (20 - 3) * (10 - 2));
}

#[test]
fn test_update_composes_to_identity_with_path_inverse() {
    // A mildly moving path: growing translation plus slight rotation.
    let path: Vec<Homography> = (0..8)
        .map(|i| {
            let a = 0.01 * i as f64;
            na::Matrix3::new(
                a.cos(),
                -a.sin(),
                1.5 * i as f64,
                a.sin(),
                a.cos(),
                -0.7 * i as f64,
                0.0,
                0.0,
                1.0,
            )
        })
        .collect();
    let smoothed = smooth_path(&path, &[0.1, 0.3, 0.5, 0.3, 0.1]);
    let (updates, warnings) = compute_updates(&path, &smoothed);

    assert!(warnings.is_empty());
    for i in 0..path.len() {
        // U = P^-1 * C, so U * C^-1 * P must be the identity.
        let sanity = updates[i] * path[i].try_inverse().unwrap() * smoothed[i];
        assert!(
            (sanity - Homography::identity()).norm() < 1e-6,
            "frame {}: {}",
            i,
            sanity
        );
    }
}

#[test]
fn test_singular_smoothed_matrix_downgrades_to_identity() {
    let path = vec![translation(2.0, 0.0), translation(4.0, 0.0)];
    let broken = vec![Homography::zeros(), translation(3.0, 0.0)];
    let (updates, warnings) = compute_updates(&path, &broken);

    assert_eq!(updates[0], Homography::identity());
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], CoreError::DegenerateSmoothedMatrix(0)));
    assert!((updates[1] - translation(1.0, 0.0)).norm() < 1e-12);
}

#[test]
fn test_warp_keeps_frame_dimensions() {
    let frame = checkerboard(50, 30);
    let u = na::Matrix3::new(
        1.01, 0.02, -4.0, //
        -0.01, 0.99, 2.5, //
        1e-5, -1e-5, 1.0,
    );
    let warped = warp_frame(&frame, &u);
    assert_eq!(warped.dimensions(), (50, 30));
}

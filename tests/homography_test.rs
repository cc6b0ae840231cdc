use glam::Vec2;
use nalgebra as na;
use video_stabilizer::homography::{dlt_homography, h_apply};

fn grid(nx: usize, ny: usize, spacing: f32) -> Vec<Vec2> {
    let mut pts = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            pts.push(Vec2::new(10.0 + i as f32 * spacing, 10.0 + j as f32 * spacing));
        }
    }
    pts
}

#[test]
fn test_dlt_recovers_translation() {
    let src = grid(4, 4, 30.0);
    let dst: Vec<Vec2> = src.iter().map(|p| *p + Vec2::new(7.5, -3.25)).collect();

    let h = dlt_homography(&src, &dst).unwrap();
    assert!((h[(0, 0)] - 1.0).abs() < 1e-6);
    assert!((h[(1, 1)] - 1.0).abs() < 1e-6);
    assert!((h[(0, 2)] - 7.5).abs() < 1e-4);
    assert!((h[(1, 2)] + 3.25).abs() < 1e-4);
    assert!((h[(2, 2)] - 1.0).abs() < 1e-12);
}

#[test]
fn test_dlt_recovers_projective_transform() {
    let truth = na::Matrix3::new(
        1.02, 0.013, 5.0, //
        -0.015, 0.98, -3.0, //
        1.0e-4, -5.0e-5, 1.0,
    );
    let src = grid(5, 5, 25.0);
    let dst: Vec<Vec2> = src.iter().map(|p| h_apply(&truth, *p)).collect();

    let h = dlt_homography(&src, &dst).unwrap();
    // Compare by reprojection rather than entrywise: the f32 point storage
    // already costs a few 1e-5 px.
    for p in &src {
        let d = (h_apply(&h, *p) - h_apply(&truth, *p)).length();
        assert!(d < 0.05, "reprojection error {} too large", d);
    }
}

#[test]
fn test_dlt_minimal_four_point_sample() {
    let src = vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(100.0, 5.0),
        Vec2::new(8.0, 95.0),
        Vec2::new(110.0, 102.0),
    ];
    let dst: Vec<Vec2> = src.iter().map(|p| *p + Vec2::new(-12.0, 4.0)).collect();

    let h = dlt_homography(&src, &dst).unwrap();
    for (p, q) in src.iter().zip(dst.iter()) {
        assert!((h_apply(&h, *p) - *q).length() < 1e-3);
    }
}

#[test]
fn test_h_apply_dehomogenizes() {
    let h = na::Matrix3::new(
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 2.0,
    );
    let q = h_apply(&h, Vec2::new(4.0, 6.0));
    assert!((q.x - 2.0).abs() < 1e-6);
    assert!((q.y - 3.0).abs() < 1e-6);
}

#[test]
fn test_dlt_rejects_insufficient_points() {
    let src = grid(3, 1, 10.0);
    let dst = src.clone();
    assert!(dlt_homography(&src, &dst).is_none());

    let four = grid(2, 2, 10.0);
    assert!(dlt_homography(&four, &src).is_none()); // length mismatch
}

#[test]
fn test_dlt_collinear_points_are_degenerate() {
    let src: Vec<Vec2> = (0..4).map(|i| Vec2::new(i as f32 * 10.0, 0.0)).collect();
    let dst: Vec<Vec2> = src.iter().map(|p| *p + Vec2::new(1.0, 1.0)).collect();

    // Collinear correspondences cannot pin down a homography; the solve
    // either fails outright or returns a near-singular matrix.
    match dlt_homography(&src, &dst) {
        None => {}
        Some(h) => assert!(h.determinant().abs() < 1e-6),
    }
}

//! Brute-force descriptor matching with cross-check.

use crate::features::Feature;

/// Pairing of one keypoint in the query set with one in the train set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub query: usize,
    pub train: usize,
    pub distance: f32,
}

/// L2 brute-force matcher. A pair `(i, j)` is retained only if `j` is the
/// nearest neighbor of `i` among the train descriptors AND `i` is the
/// nearest neighbor of `j` among the query descriptors. Ties are broken by
/// the lower index, so the output is deterministic.
pub fn match_descriptors(query: &[Feature], train: &[Feature]) -> Vec<Match> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    let nq = query.len();
    let nt = train.len();
    let mut dist2 = vec![0f32; nq * nt];
    for (i, q) in query.iter().enumerate() {
        for (j, t) in train.iter().enumerate() {
            dist2[i * nt + j] = l2_squared(&q.descriptor, &t.descriptor);
        }
    }

    let nearest_train: Vec<usize> = (0..nq)
        .map(|i| argmin(&dist2[i * nt..(i + 1) * nt]))
        .collect();
    let nearest_query: Vec<usize> = (0..nt)
        .map(|j| argmin_strided(&dist2, j, nt, nq))
        .collect();

    let mut matches = Vec::new();
    for (i, &j) in nearest_train.iter().enumerate() {
        if nearest_query[j] == i {
            matches.push(Match {
                query: i,
                train: j,
                distance: dist2[i * nt + j].sqrt(),
            });
        }
    }
    matches
}

fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn argmin(row: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate() {
        if v < row[best] {
            best = i;
        }
    }
    best
}

fn argmin_strided(dist2: &[f32], col: usize, stride: usize, rows: usize) -> usize {
    let mut best = 0;
    for i in 0..rows {
        if dist2[i * stride + col] < dist2[best * stride + col] {
            best = i;
        }
    }
    best
}

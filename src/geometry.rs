//! Center-in-triangle geometry for three points on a circle
//!
//! Three points on a circle contain the center in their triangle iff no arc
//! between consecutive (sorted) points spans a half circle or more. Working
//! from angles keeps the decision independent of the orbit radius.

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::consts::{ARC_EPSILON, DOT_COUNT};
use crate::{normalize_angle, polar_to_cartesian};

/// Where the center ends up relative to the triangle; also the side a bet backs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    In,
    Out,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::In => "in",
            Side::Out => "out",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "in" => Some(Side::In),
            "out" => Some(Side::Out),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::In => Side::Out,
            Side::Out => Side::In,
        }
    }
}

/// The three consecutive arc spans between the sorted angles (sums to 2π)
pub fn arcs(angles: [f64; DOT_COUNT]) -> [f64; DOT_COUNT] {
    let mut sorted = angles.map(normalize_angle);
    sorted.sort_by(f64::total_cmp);
    [
        sorted[1] - sorted[0],
        sorted[2] - sorted[1],
        TAU - (sorted[2] - sorted[0]),
    ]
}

/// Decide whether the center lies strictly inside the triangle.
///
/// Every arc must be shorter than a half circle and longer than zero, both
/// with an epsilon margin, so coincident points and diameters resolve to
/// [`Side::Out`].
pub fn resolve(angles: [f64; DOT_COUNT]) -> Side {
    let inside = arcs(angles)
        .iter()
        .all(|&arc| arc < PI - ARC_EPSILON && arc > ARC_EPSILON);
    if inside { Side::In } else { Side::Out }
}

/// Cartesian triangle vertices on a circle of the given radius
pub fn triangle(angles: [f64; DOT_COUNT], radius: f64) -> [DVec2; DOT_COUNT] {
    angles.map(|theta| polar_to_cartesian(radius, theta))
}

#[inline]
fn cross(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// Sign-of-cross-product containment test for the origin.
///
/// Points on an edge count as inside, so this is only an independent
/// cross-check of [`resolve`] away from the boundaries.
pub fn contains_center(vertices: &[DVec2; DOT_COUNT]) -> bool {
    let [v1, v2, v3] = *vertices;
    let d1 = cross(DVec2::ZERO, v1, v2);
    let d2 = cross(DVec2::ZERO, v2, v3);
    let d3 = cross(DVec2::ZERO, v3, v1);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// The triangle edge closest to the center ("how close was it")
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeProximity {
    /// Dot ids at either end of the edge
    pub edge: (usize, usize),
    /// Distance from the center to the edge segment
    pub distance: f64,
    /// Nearest point on the edge
    pub closest_point: DVec2,
}

fn closest_point_on_segment(p: DVec2, a: DVec2, b: DVec2) -> DVec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Find the edge nearest the center for the triangle on a circle of `radius`
pub fn closest_edge(angles: [f64; DOT_COUNT], radius: f64) -> EdgeProximity {
    let vertices = triangle(angles, radius);
    let proximity = |(a, b): (usize, usize)| {
        let point = closest_point_on_segment(DVec2::ZERO, vertices[a], vertices[b]);
        EdgeProximity {
            edge: (a, b),
            distance: point.length(),
            closest_point: point,
        }
    };

    let [first, second, third] = [(0, 1), (1, 2), (2, 0)].map(proximity);
    [second, third]
        .into_iter()
        .fold(first, |best, e| if e.distance < best.distance { e } else { best })
}

/// Result of a Monte-Carlo run over uniform angle triples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonteCarloReport {
    pub samples: u64,
    pub in_count: u64,
    pub out_count: u64,
}

impl MonteCarloReport {
    /// Empirical P(In); 1/4 analytically
    pub fn in_fraction(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.in_count as f64 / self.samples as f64
        }
    }

    pub fn out_fraction(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.out_count as f64 / self.samples as f64
        }
    }
}

/// Sample `samples` uniform triples and count the verdicts
pub fn estimate_in_probability<R: Rng + ?Sized>(rng: &mut R, samples: u64) -> MonteCarloReport {
    let mut in_count = 0;
    for _ in 0..samples {
        let angles = [
            rng.random::<f64>() * TAU,
            rng.random::<f64>() * TAU,
            rng.random::<f64>() * TAU,
        ];
        if resolve(angles) == Side::In {
            in_count += 1;
        }
    }
    MonteCarloReport {
        samples,
        in_count,
        out_count: samples - in_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_equilateral_is_in() {
        // Equal arcs of 2π/3 are all strictly below π
        let angles = [0.0, TAU / 3.0, 2.0 * TAU / 3.0];
        assert_eq!(resolve(angles), Side::In);
    }

    #[test]
    fn test_diameter_is_out() {
        assert_eq!(resolve([0.0, PI, PI / 2.0]), Side::Out);
        assert_eq!(resolve([0.3, 0.3 + PI, 4.0]), Side::Out);
    }

    #[test]
    fn test_coincident_is_out() {
        assert_eq!(resolve([1.0, 1.0, 4.0]), Side::Out);
        assert_eq!(resolve([2.0, 2.0, 2.0]), Side::Out);
        // Coincident across the 0/2π seam
        assert_eq!(resolve([0.0, TAU, PI]), Side::Out);
    }

    #[test]
    fn test_clustered_is_out() {
        assert_eq!(resolve([0.1, 0.5, 1.0]), Side::Out);
    }

    #[test]
    fn test_unnormalized_input() {
        let base = [0.2, 2.3, 4.4];
        let shifted = [0.2 + TAU, 2.3 - TAU, 4.4 + 3.0 * TAU];
        assert_eq!(resolve(base), resolve(shifted));
        assert_eq!(resolve(base), Side::In);
    }

    #[test]
    fn test_arcs_sum_to_full_circle() {
        let a = arcs([5.0, 0.5, 3.0]);
        assert!((a.iter().sum::<f64>() - TAU).abs() < 1e-12);
        assert!((a[0] - 2.5).abs() < 1e-12);
        assert!((a[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cross_product_agrees_away_from_boundaries() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..10_000 {
            let angles = [
                rng.random::<f64>() * TAU,
                rng.random::<f64>() * TAU,
                rng.random::<f64>() * TAU,
            ];
            if closest_edge(angles, 1.0).distance < 1e-6 {
                continue;
            }
            let inside = contains_center(&triangle(angles, 1.0));
            assert_eq!(resolve(angles) == Side::In, inside, "angles {angles:?}");
        }
    }

    #[test]
    fn test_closest_edge() {
        // Right triangle with hypotenuse on the diameter: center sits on it
        let p = closest_edge([0.0, PI / 2.0, PI], 100.0);
        assert!(p.distance < 1e-9);
        assert_eq!(p.edge, (2, 0));

        // Equilateral: every edge is r/2 from the center
        let p = closest_edge([0.0, TAU / 3.0, 2.0 * TAU / 3.0], 100.0);
        assert!((p.distance - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_monte_carlo_quarter_in() {
        let mut rng = Pcg32::seed_from_u64(2024);
        let report = estimate_in_probability(&mut rng, 200_000);
        assert_eq!(report.in_count + report.out_count, report.samples);
        assert!((report.in_fraction() - 0.25).abs() < 0.01, "{report:?}");
        assert!((report.out_fraction() - 0.75).abs() < 0.01, "{report:?}");
    }

    #[test]
    fn test_side_parse() {
        assert_eq!(Side::from_str("IN"), Some(Side::In));
        assert_eq!(Side::from_str("out"), Some(Side::Out));
        assert_eq!(Side::from_str("maybe"), None);
        assert_eq!(Side::In.opposite(), Side::Out);
    }

    proptest! {
        #[test]
        fn prop_resolve_permutation_invariant(
            a in 0.0..TAU,
            b in 0.0..TAU,
            c in 0.0..TAU,
        ) {
            let expected = resolve([a, b, c]);
            for perm in [[a, c, b], [b, a, c], [b, c, a], [c, a, b], [c, b, a]] {
                prop_assert_eq!(resolve(perm), expected);
            }
        }

        #[test]
        fn prop_rotation_invariant(
            a in 0.0..TAU,
            b in 0.0..TAU,
            c in 0.0..TAU,
            shift in 0.0..TAU,
        ) {
            // Skip near-boundary triples where rounding may legitimately flip
            let near_boundary = arcs([a, b, c])
                .iter()
                .any(|&arc| (arc - PI).abs() < 1e-6 || arc < 1e-6);
            prop_assume!(!near_boundary);
            prop_assert_eq!(resolve([a + shift, b + shift, c + shift]), resolve([a, b, c]));
        }
    }
}

use glam::DVec2;
use serde::Serialize;

use super::invert3x3;

/// 2D affine matrix `[a, b, c, d, e, f]` mapping
/// `(x, y) -> (a*x + c*y + e, b*x + d*y + f)`.
///
/// Component order matches the `matrix(a, b, c, d, e, f)` transform
/// primitive of vector scene formats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Affine2(pub [f64; 6]);

impl Affine2 {
    pub const IDENTITY: Affine2 = Affine2([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// Rotation by `degrees` about `pivot`.
    pub fn rotation_about(degrees: f64, pivot: DVec2) -> Affine2 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Affine2([
            cos,
            sin,
            -sin,
            cos,
            pivot.x - cos * pivot.x + sin * pivot.y,
            pivot.y - sin * pivot.x - cos * pivot.y,
        ])
    }

    pub fn transform_point(&self, p: DVec2) -> DVec2 {
        let [a, b, c, d, e, f] = self.0;
        DVec2::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// `self * rhs`: the map that applies `rhs` first, then `self`.
    pub fn mul(&self, rhs: &Affine2) -> Affine2 {
        let [a, b, c, d, e, f] = self.0;
        let [ra, rb, rc, rd, re, rf] = rhs.0;
        Affine2([
            a * ra + c * rb,
            b * ra + d * rb,
            a * rc + c * rd,
            b * rc + d * rd,
            a * re + c * rf + e,
            b * re + d * rf + f,
        ])
    }

    /// Components rounded to three decimal places, the precision used in
    /// emitted documents.
    pub fn rounded(&self) -> Affine2 {
        Affine2(self.0.map(|v| (v * 1000.0).round() / 1000.0))
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Recovers the unique affine map sending each `src` vertex to the `dst`
/// vertex of the same index.
///
/// Exact for non-collinear `src` (two square linear systems sharing one
/// 3x3 inverse); degenerate `src` yields a non-finite matrix.
pub fn solve_triangle_affine(src: [DVec2; 3], dst: [DVec2; 3]) -> Affine2 {
    let inv = invert3x3([
        src[0].x, src[0].y, 1.0, //
        src[1].x, src[1].y, 1.0, //
        src[2].x, src[2].y, 1.0,
    ]);
    Affine2([
        inv[0] * dst[0].x + inv[1] * dst[1].x + inv[2] * dst[2].x,
        inv[0] * dst[0].y + inv[1] * dst[1].y + inv[2] * dst[2].y,
        inv[3] * dst[0].x + inv[4] * dst[1].x + inv[5] * dst[2].x,
        inv[3] * dst[0].y + inv[4] * dst[1].y + inv[5] * dst[2].y,
        inv[6] * dst[0].x + inv[7] * dst[1].x + inv[8] * dst[2].x,
        inv[6] * dst[0].y + inv[7] * dst[1].y + inv[8] * dst[2].y,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    fn assert_close(got: DVec2, want: DVec2, tol: f64) {
        assert!(
            (got - want).length() < tol,
            "got {got:?}, want {want:?}"
        );
    }

    #[test]
    fn solved_matrix_maps_vertices_exactly() {
        let src = [dvec2(0.0, 0.0), dvec2(2048.0, 0.0), dvec2(0.0, 2048.0)];
        let dst = [
            dvec2(10.0, -3.0),
            dvec2(1900.5, 120.0),
            dvec2(-80.0, 2000.0),
        ];
        let m = solve_triangle_affine(src, dst);
        for (s, d) in src.iter().zip(dst) {
            assert_close(m.transform_point(*s), d, 1e-6);
        }
    }

    #[test]
    fn identity_correspondence_recovers_identity() {
        let tri = [dvec2(-1.0, -1.0), dvec2(1.0, -1.0), dvec2(-1.0, 1.0)];
        let m = solve_triangle_affine(tri, tri);
        for (got, want) in m.0.iter().zip(Affine2::IDENTITY.0) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn collinear_source_is_non_finite() {
        let src = [dvec2(0.0, 0.0), dvec2(1.0, 1.0), dvec2(2.0, 2.0)];
        let dst = [dvec2(0.0, 0.0), dvec2(1.0, 0.0), dvec2(0.0, 1.0)];
        assert!(!solve_triangle_affine(src, dst).is_finite());
    }

    #[test]
    fn rotation_about_pivot_keeps_pivot_fixed() {
        let pivot = dvec2(100.0, -40.0);
        let m = Affine2::rotation_about(37.5, pivot);
        assert_close(m.transform_point(pivot), pivot, 1e-9);

        let moved = m.transform_point(pivot + dvec2(10.0, 0.0));
        assert!((moved.distance(pivot) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn mul_applies_right_hand_side_first() {
        let rot = Affine2::rotation_about(90.0, dvec2(0.0, 0.0));
        let shift = Affine2([1.0, 0.0, 0.0, 1.0, 5.0, 0.0]);
        // Shift first, then rotate: (1, 0) -> (6, 0) -> (0, 6).
        let chained = rot.mul(&shift);
        assert_close(chained.transform_point(dvec2(1.0, 0.0)), dvec2(0.0, 6.0), 1e-9);
    }

    #[test]
    fn rounded_truncates_to_three_decimals() {
        let m = Affine2([1.00049, -0.0004, 0.9995, 2.0, 1638.4004, 0.0]);
        assert_eq!(m.rounded().0, [1.0, -0.0, 1.0, 2.0, 1638.4, 0.0]);
    }
}

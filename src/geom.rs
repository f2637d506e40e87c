//!
//! # Geometric Primitives
//!
//! Point-in-polygon and line/ray-segment intersection over real-valued
//! coordinates, as used by the flattened-entity queries.
//!

/// Relative determinant cutoff below which a ray/edge pair is treated as
/// parallel (no intersection).
const PARALLEL_TOL: f64 = 1e-10;

/// Intersect the infinite line `p + t*d` with the segment from `a` to `b`.
/// Returns the parameter pair `(t, u)` with `u` restricted to `[0, 1]`,
/// or `None` for near-parallel or out-of-range cases.
pub fn intersect_line_segment(
    p: [f64; 2],
    d: [f64; 2],
    a: [f64; 2],
    b: [f64; 2],
) -> Option<(f64, f64)> {
    let e = [b[0] - a[0], b[1] - a[1]];
    // det of [[d0, -e0], [d1, -e1]]
    let det = e[0] * d[1] - d[0] * e[1];
    let scale = (d[0] * d[0] + d[1] * d[1]).sqrt() * (e[0] * e[0] + e[1] * e[1]);
    if det.abs() <= PARALLEL_TOL * scale {
        return None;
    }
    let r = [a[0] - p[0], a[1] - p[1]];
    let t = (e[0] * r[1] - e[1] * r[0]) / det;
    let u = (d[0] * r[1] - d[1] * r[0]) / det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    Some((t, u))
}

/// Intersect the ray `p + t*d` (`t > 0`) with the segment from `a` to `b`.
pub fn intersect_ray_segment(
    p: [f64; 2],
    d: [f64; 2],
    a: [f64; 2],
    b: [f64; 2],
) -> Option<(f64, f64)> {
    match intersect_line_segment(p, d, a, b) {
        Some((t, u)) if t > 0.0 => Some((t, u)),
        _ => None,
    }
}

/// Ray-casting parity test for `(x, y)` against the polygon `pts`,
/// treated as implicitly closed.
///
/// Casts a ray straight down and counts properly-crossed edges: the edge
/// parameter must land in `[0, 1)` (half-open, so shared vertices are not
/// double-counted) and the ray parameter must be strictly positive.
/// Polygons with fewer than three vertices are always "outside".
pub fn point_in_polygon(pts: &[[f64; 2]], x: f64, y: f64) -> bool {
    if pts.len() < 3 {
        return false;
    }
    let mut crossings = 0;
    for i in 0..pts.len() {
        let a = pts[i];
        let b = pts[(i + 1) % pts.len()];
        if let Some((t, u)) = intersect_line_segment([x, y], [0.0, -1.0], a, b) {
            if t > 0.0 && u < 1.0 {
                crossings += 1;
            }
        }
    }
    crossings % 2 == 1
}

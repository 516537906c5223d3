//! Planar distance and point predicates
//!
//! Distances are computed leaf against leaf, segment against segment, all in
//! 2D. Containment (a point of one leaf inside the other's polygon) and
//! crossing segments short-circuit to zero.

use crate::error::{check_same_srid, GeomError, Result};
use crate::geometry::{for_each_leaf, validate, Coord, GeomKind, Inspected, LeafView, SeqView};

/// Minimum 2D distance between any leaf of `a` and any leaf of `b`.
///
/// `None` when either value holds no vertices.
pub fn min_distance2d(a: &[u8], b: &[u8]) -> Result<Option<f64>> {
    validate(a)?;
    validate(b)?;
    check_same_srid(Inspected::new(a)?.srid(), Inspected::new(b)?.srid())?;

    let left = leaves(a)?;
    let right = leaves(b)?;
    tracing::debug!(left = left.len(), right = right.len(), "min distance");

    let mut best: Option<f64> = None;
    for la in &left {
        for lb in &right {
            let d = leaf_distance(la, lb);
            if d.is_finite() && best.map_or(true, |b| d < b) {
                best = Some(d);
            }
            if best == Some(0.0) {
                return Ok(best);
            }
        }
    }
    Ok(best)
}

/// Whether a Point lies within `r` of (cx, cy)
pub fn point_inside_circle(buf: &[u8], cx: f64, cy: f64, r: f64) -> Result<bool> {
    let leaf = LeafView::parse(buf)?;
    if leaf.kind() != GeomKind::Point {
        return Err(GeomError::unsupported(format!(
            "point_inside_circle needs a Point, got {}",
            leaf.kind().name()
        )));
    }
    let p = leaf
        .sequences()
        .next()
        .map(|s| s.get(0))
        .ok_or_else(|| GeomError::malformed("point without a tuple"))?;
    Ok(p.distance2d(&Coord::xy(cx, cy)) <= r)
}

fn leaves(buf: &[u8]) -> Result<Vec<LeafView<'_>>> {
    let mut out = Vec::new();
    for_each_leaf(buf, &mut |leaf| {
        if leaf.npoints() > 0 {
            out.push(*leaf);
        }
        Ok(())
    })?;
    Ok(out)
}

fn leaf_distance(a: &LeafView<'_>, b: &LeafView<'_>) -> f64 {
    if polygon_contains_first_point(a, b) || polygon_contains_first_point(b, a) {
        return 0.0;
    }
    let mut best = f64::INFINITY;
    for sa in a.sequences() {
        for sb in b.sequences() {
            best = best.min(seq_distance(&sa, &sb));
            if best == 0.0 {
                return 0.0;
            }
        }
    }
    best
}

/// True when `poly` is a polygon and the first vertex of `other` lies in it
fn polygon_contains_first_point(poly: &LeafView<'_>, other: &LeafView<'_>) -> bool {
    if poly.kind() != GeomKind::Polygon {
        return false;
    }
    let first = other.sequences().find(|s| !s.is_empty()).map(|s| s.get(0));
    match first {
        Some(p) => point_in_polygon(&p, poly),
        None => false,
    }
}

/// Inside the shell and outside every hole
pub fn point_in_polygon(p: &Coord, poly: &LeafView<'_>) -> bool {
    let mut rings = poly.sequences();
    match rings.next() {
        Some(shell) if point_in_ring(p, &shell) => rings.all(|hole| !point_in_ring(p, &hole)),
        _ => false,
    }
}

/// Crossing-number test; the ring is treated as closed
fn point_in_ring(p: &Coord, ring: &SeqView<'_>) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring.get(i);
        let b = ring.get(j);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Segments of a sequence; a single vertex is a degenerate segment
fn segments<'a>(seq: &SeqView<'a>) -> impl Iterator<Item = (Coord, Coord)> + 'a {
    let seq = *seq;
    let n = seq.len();
    let count = if n == 1 { 1 } else { n.saturating_sub(1) };
    (0..count).map(move |i| {
        let a = seq.get(i);
        let b = if n == 1 { a } else { seq.get(i + 1) };
        (a, b)
    })
}

fn seq_distance(a: &SeqView<'_>, b: &SeqView<'_>) -> f64 {
    let mut best = f64::INFINITY;
    for (a1, a2) in segments(a) {
        for (b1, b2) in segments(b) {
            best = best.min(segment_distance(&a1, &a2, &b1, &b2));
            if best == 0.0 {
                return 0.0;
            }
        }
    }
    best
}

/// Segment-to-segment minimum distance
pub fn segment_distance(a1: &Coord, a2: &Coord, b1: &Coord, b2: &Coord) -> f64 {
    if segments_intersect(a1, a2, b1, b2) {
        return 0.0;
    }
    point_segment_distance(a1, b1, b2)
        .min(point_segment_distance(a2, b1, b2))
        .min(point_segment_distance(b1, a1, a2))
        .min(point_segment_distance(b2, a1, a2))
}

/// Point-to-segment minimum distance
pub fn point_segment_distance(p: &Coord, a: &Coord, b: &Coord) -> f64 {
    let ab = [b.x - a.x, b.y - a.y];
    let ap = [p.x - a.x, p.y - a.y];
    let ab_len2 = ab[0] * ab[0] + ab[1] * ab[1];

    if ab_len2 == 0.0 {
        // Degenerate segment
        return p.distance2d(a);
    }

    let t = ((ap[0] * ab[0] + ap[1] * ab[1]) / ab_len2).clamp(0.0, 1.0);
    let closest = Coord::xy(a.x + t * ab[0], a.y + t * ab[1]);
    p.distance2d(&closest)
}

fn orientation(a: &Coord, b: &Coord, c: &Coord) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: &Coord, b: &Coord, p: &Coord) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_intersect(a1: &Coord, a2: &Coord, b1: &Coord, b2: &Coord) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0)) {
        return true;
    }
    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{encode, Dims, GeometryNode, PointSeq};

    fn pt(x: f64, y: f64) -> Vec<u8> {
        encode(&GeometryNode::point(Dims::Xy, Coord::xy(x, y))).unwrap()
    }

    fn seq(pts: &[(f64, f64)]) -> PointSeq {
        let coords: Vec<Coord> = pts.iter().map(|&(x, y)| Coord::xy(x, y)).collect();
        PointSeq::from_coords(Dims::Xy, &coords)
    }

    fn line(pts: &[(f64, f64)]) -> Vec<u8> {
        encode(&GeometryNode::line(seq(pts))).unwrap()
    }

    fn square_with_hole() -> Vec<u8> {
        let shell = seq(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        let hole = seq(&[(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0), (4.0, 4.0)]);
        encode(&GeometryNode::polygon(Dims::Xy, vec![shell, hole])).unwrap()
    }

    #[test]
    fn test_point_segment_distance() {
        let d = point_segment_distance(&Coord::xy(0.0, 1.0), &Coord::xy(0.0, 0.0), &Coord::xy(2.0, 0.0));
        assert_eq!(d, 1.0);
    }

    #[test]
    fn test_point_to_point() {
        assert_eq!(min_distance2d(&pt(0.0, 0.0), &pt(3.0, 4.0)).unwrap(), Some(5.0));
    }

    #[test]
    fn test_crossing_lines_touch() {
        let a = line(&[(0.0, 0.0), (2.0, 2.0)]);
        let b = line(&[(0.0, 2.0), (2.0, 0.0)]);
        assert_eq!(min_distance2d(&a, &b).unwrap(), Some(0.0));
    }

    #[test]
    fn test_parallel_lines() {
        let a = line(&[(0.0, 0.0), (5.0, 0.0)]);
        let b = line(&[(1.0, 3.0), (4.0, 3.0)]);
        assert_eq!(min_distance2d(&a, &b).unwrap(), Some(3.0));
    }

    #[test]
    fn test_point_in_polygon_honours_holes() {
        let poly = square_with_hole();
        assert_eq!(min_distance2d(&pt(2.0, 2.0), &poly).unwrap(), Some(0.0));
        assert_eq!(min_distance2d(&poly, &pt(5.0, 5.0)).unwrap(), Some(1.0));
        assert_eq!(min_distance2d(&pt(13.0, 14.0), &poly).unwrap(), Some(5.0));
    }

    #[test]
    fn test_empty_operand_has_no_distance() {
        let empty = encode(&GeometryNode::container(GeomKind::Collection, Dims::Xy, vec![])).unwrap();
        assert_eq!(min_distance2d(&empty, &pt(0.0, 0.0)).unwrap(), None);
    }

    #[test]
    fn test_srid_mismatch() {
        let a = encode(&GeometryNode::point(Dims::Xy, Coord::xy(0.0, 0.0)).with_srid(Some(4326))).unwrap();
        assert!(matches!(
            min_distance2d(&a, &pt(1.0, 1.0)),
            Err(GeomError::IncompatibleReferenceSystems { .. })
        ));
    }

    #[test]
    fn test_point_inside_circle() {
        assert!(point_inside_circle(&pt(1.0, 1.0), 0.0, 0.0, 2.0).unwrap());
        assert!(!point_inside_circle(&pt(3.0, 3.0), 0.0, 0.0, 2.0).unwrap());
        assert!(matches!(
            point_inside_circle(&line(&[(0.0, 0.0), (1.0, 1.0)]), 0.0, 0.0, 2.0),
            Err(GeomError::UnsupportedInput(_))
        ));
    }
}

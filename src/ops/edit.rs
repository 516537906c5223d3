//! Tree edits: decode, rewrite the point sequences, encode.
//! Cached boxes are kept as they are; none of these edits moves the extent.

use crate::error::{GeomError, Result};
use crate::geometry::{decode, encode, validate, Coord, GeomKind, GeometryNode, Inspected, PointSeq};

fn edit_seqs<F>(buf: &[u8], mut f: F) -> Result<Vec<u8>>
where
    F: FnMut(&mut PointSeq, Option<usize>),
{
    let mut node: GeometryNode = decode(buf)?;
    node.for_each_seq_mut(&mut f);
    encode(&node)
}

/// Reverse the vertex order of every line and ring
pub fn reverse(buf: &[u8]) -> Result<Vec<u8>> {
    edit_seqs(buf, |seq, _| seq.reverse())
}

/// Orient polygon shells clockwise and holes counter-clockwise
pub fn force_rhr(buf: &[u8]) -> Result<Vec<u8>> {
    let mut flipped = 0usize;
    let out = edit_seqs(buf, |seq, ring| {
        let wrong = match ring {
            Some(0) => seq.signed_area() > 0.0,
            Some(_) => seq.signed_area() < 0.0,
            None => false,
        };
        if wrong {
            seq.reverse();
            flipped += 1;
        }
    })?;
    tracing::debug!(flipped, "forced right-hand rule");
    Ok(out)
}

/// Densify lines and rings so no segment is longer than `max_len` in 2D.
/// Added vertices have Z and M set to 0.
pub fn segmentize2d(buf: &[u8], max_len: f64) -> Result<Vec<u8>> {
    if !(max_len.is_finite() && max_len > 0.0) {
        return Err(GeomError::unsupported(format!(
            "segment length must be positive, got {}",
            max_len
        )));
    }
    validate(buf)?;
    if matches!(Inspected::new(buf)?.kind(), GeomKind::Point | GeomKind::MultiPoint) {
        return Ok(buf.to_vec());
    }
    let mut added = 0usize;
    let out = edit_seqs(buf, |seq, _| {
        let before = seq.len();
        *seq = densify(seq, max_len);
        added += seq.len() - before;
    })?;
    tracing::debug!(max_len, added, size = out.len(), "segmentized");
    Ok(out)
}

fn densify(seq: &PointSeq, max_len: f64) -> PointSeq {
    let mut out = PointSeq::with_capacity(seq.dims(), seq.len());
    let mut prev: Option<Coord> = None;
    for c in seq.iter() {
        if let Some(p) = prev {
            let len = p.distance2d(&c);
            let mut k = 1.0;
            // an unbounded segment cannot be split
            while len.is_finite() && k * max_len < len {
                let step = k * max_len;
                out.push(Coord::xy(
                    p.x + (c.x - p.x) * step / len,
                    p.y + (c.y - p.y) * step / len,
                ));
                k += 1.0;
            }
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Box2D, Dims, Shape};

    fn ring(pts: &[(f64, f64)]) -> PointSeq {
        let coords: Vec<Coord> = pts.iter().map(|&(x, y)| Coord::xy(x, y)).collect();
        PointSeq::from_coords(Dims::Xy, &coords)
    }

    fn rings_of(buf: &[u8]) -> Vec<PointSeq> {
        match decode(buf).unwrap().shape {
            Shape::Polygon(r) => r,
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_reverse_keeps_bbox() {
        let line = GeometryNode::line(ring(&[(0.0, 0.0), (1.0, 2.0), (3.0, 3.0)]))
            .with_bbox(Some(Box2D::new(0.0, 0.0, 3.0, 3.0)));
        let out = decode(&reverse(&encode(&line).unwrap()).unwrap()).unwrap();
        assert_eq!(out.bbox, line.bbox);
        match out.shape {
            Shape::Line(p) => assert_eq!(p.ordinates(), &[3.0, 3.0, 1.0, 2.0, 0.0, 0.0]),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_force_rhr_orients_rings() {
        // counter-clockwise shell, clockwise hole: both wrong
        let shell = ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]);
        let hole = ring(&[(1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0), (1.0, 1.0)]);
        let poly = encode(&GeometryNode::polygon(Dims::Xy, vec![shell, hole])).unwrap();
        let rings = rings_of(&force_rhr(&poly).unwrap());
        assert!(rings[0].signed_area() < 0.0);
        assert!(rings[1].signed_area() > 0.0);

        let again = force_rhr(&force_rhr(&poly).unwrap()).unwrap();
        assert_eq!(rings_of(&again), rings);
    }

    #[test]
    fn test_segmentize_inserts_vertices() {
        let line = GeometryNode::line(PointSeq::from_coords(
            Dims::Xyz,
            &[Coord::new(0.0, 0.0, 5.0, 0.0), Coord::new(10.0, 0.0, 5.0, 0.0)],
        ));
        let out = decode(&segmentize2d(&encode(&line).unwrap(), 4.0).unwrap()).unwrap();
        match out.shape {
            Shape::Line(p) => {
                let xs: Vec<f64> = p.iter().map(|c| c.x).collect();
                assert_eq!(xs, vec![0.0, 4.0, 8.0, 10.0]);
                assert_eq!(p.get(1).z, 0.0);
                assert_eq!(p.get(3).z, 5.0);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_segmentize_points_unchanged() {
        let pt = encode(&GeometryNode::point(Dims::Xy, Coord::xy(1.0, 1.0))).unwrap();
        assert_eq!(segmentize2d(&pt, 0.5).unwrap(), pt);
    }

    #[test]
    fn test_segmentize_leaves_unbounded_segments() {
        let line = GeometryNode::line(ring(&[(0.0, 0.0), (f64::INFINITY, 0.0), (f64::MAX, f64::MAX), (-f64::MAX, -f64::MAX)]));
        let out = decode(&segmentize2d(&encode(&line).unwrap(), 1.0).unwrap()).unwrap();
        assert_eq!(out.npoints(), 4);
    }

    #[test]
    fn test_segmentize_rejects_non_positive_length() {
        let pt = encode(&GeometryNode::point(Dims::Xy, Coord::xy(1.0, 1.0))).unwrap();
        for bad in [0.0, -1.0, f64::NAN] {
            assert!(matches!(segmentize2d(&pt, bad), Err(GeomError::UnsupportedInput(_))));
        }
    }
}

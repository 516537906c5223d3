//! Single-geometry constructors
//!
//! Inputs of the wrong kind are a hard `UnsupportedInput` failure. Operands
//! must agree on SRID; the result carries that SRID and no cached bbox.

use super::decode_kind;
use crate::error::{check_same_srid, GeomError, Result};
use crate::geometry::{decode, encode, Coord, Dims, GeomKind, GeometryNode, PointSeq, Shape};

pub fn make_point(x: f64, y: f64) -> Result<Vec<u8>> {
    encode(&GeometryNode::point(Dims::Xy, Coord::xy(x, y)))
}

pub fn make_point_3dz(x: f64, y: f64, z: f64) -> Result<Vec<u8>> {
    encode(&GeometryNode::point(Dims::Xyz, Coord::new(x, y, z, 0.0)))
}

pub fn make_point_3dm(x: f64, y: f64, m: f64) -> Result<Vec<u8>> {
    encode(&GeometryNode::point(Dims::Xym, Coord::new(x, y, 0.0, m)))
}

pub fn make_point_4d(x: f64, y: f64, z: f64, m: f64) -> Result<Vec<u8>> {
    encode(&GeometryNode::point(Dims::Xyzm, Coord::new(x, y, z, m)))
}

/// Two-vertex line; dims are the union of both points
pub fn make_line(a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    let a = decode_kind(a, GeomKind::Point)?;
    let b = decode_kind(b, GeomKind::Point)?;
    check_same_srid(a.srid, b.srid)?;
    let dims = a.dims.union(b.dims);
    let mut seq = PointSeq::with_capacity(dims, 2);
    for p in [&a, &b] {
        push_point(&mut seq, p);
    }
    encode(&GeometryNode::line(seq).with_srid(a.srid))
}

/// Line through every Point of `inputs`, in order.
///
/// Absent and non-Point entries are skipped; `None` when no Point remains.
pub fn make_line_many(inputs: &[Option<&[u8]>]) -> Result<Option<Vec<u8>>> {
    let mut points = Vec::new();
    let mut srid: Option<Option<i32>> = None;
    for buf in inputs.iter().flatten() {
        let node = decode(buf)?;
        match srid {
            Some(s) => check_same_srid(s, node.srid)?,
            None => srid = Some(node.srid),
        }
        if node.kind() == GeomKind::Point {
            points.push(node);
        } else {
            tracing::trace!(kind = node.kind().name(), "skipping non-point in line construction");
        }
    }
    let dims = match points.first() {
        Some(first) => points.iter().fold(first.dims, |d, p| d.union(p.dims)),
        None => return Ok(None),
    };
    let mut seq = PointSeq::with_capacity(dims, points.len());
    for p in &points {
        push_point(&mut seq, p);
    }
    tracing::debug!(inputs = inputs.len(), points = seq.len(), "built line");
    let line = GeometryNode::line(seq).with_srid(srid.flatten());
    encode(&line).map(Some)
}

/// Line through the members of a MultiPoint
pub fn line_from_multipoint(buf: &[u8]) -> Result<Vec<u8>> {
    let multi = decode_kind(buf, GeomKind::MultiPoint)?;
    let mut seq = PointSeq::with_capacity(multi.dims, multi.children().len());
    for p in multi.children() {
        push_point(&mut seq, p);
    }
    encode(&GeometryNode::line(seq).with_srid(multi.srid))
}

/// Polygon from a closed shell line and closed hole lines
pub fn make_polygon(shell: &[u8], holes: &[&[u8]]) -> Result<Vec<u8>> {
    let shell = ring_from_line(shell, "shell")?;
    let mut rings = Vec::with_capacity(holes.len() + 1);
    let srid = shell.srid;
    let dims = shell.dims;
    rings.push(into_points(shell));
    for (i, hole) in holes.iter().enumerate() {
        let hole = ring_from_line(hole, &format!("hole {}", i))?;
        check_same_srid(srid, hole.srid)?;
        rings.push(into_points(hole).to_dims(dims));
    }
    encode(&GeometryNode::polygon(dims, rings).with_srid(srid))
}

/// Insert `point` before vertex `position`, or append when `None`
pub fn add_point(line: &[u8], point: &[u8], position: Option<usize>) -> Result<Vec<u8>> {
    let line = decode_kind(line, GeomKind::Line)?;
    let point = decode_kind(point, GeomKind::Point)?;
    check_same_srid(line.srid, point.srid)?;
    let srid = line.srid;
    let dims = line.dims.union(point.dims);
    let mut seq = into_points(line).to_dims(dims);
    let at = position.unwrap_or(seq.len());
    if at > seq.len() {
        return Err(GeomError::unsupported(format!(
            "position {} out of range for a line of {} points",
            at,
            seq.len()
        )));
    }
    let c = first_coord(&point).ok_or_else(|| GeomError::malformed("point without a tuple"))?;
    seq.insert(at, c);
    encode(&GeometryNode::line(seq).with_srid(srid))
}

fn first_coord(node: &GeometryNode) -> Option<Coord> {
    match &node.shape {
        Shape::Point(p) => p.first(),
        _ => None,
    }
}

fn push_point(seq: &mut PointSeq, node: &GeometryNode) {
    if let Some(c) = first_coord(node) {
        seq.push(c);
    }
}

fn into_points(node: GeometryNode) -> PointSeq {
    match node.shape {
        Shape::Line(p) => p,
        _ => PointSeq::new(node.dims),
    }
}

fn ring_from_line(buf: &[u8], what: &str) -> Result<GeometryNode> {
    let line = decode_kind(buf, GeomKind::Line)?;
    if let Shape::Line(p) = &line.shape {
        if p.len() < 4 {
            return Err(GeomError::unsupported(format!(
                "{} must have at least 4 points, got {}",
                what,
                p.len()
            )));
        }
        if !p.is_closed2d() {
            return Err(GeomError::unsupported(format!("{} is not closed", what)));
        }
    }
    Ok(line)
}

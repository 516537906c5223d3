//! Cached bounding box management and box-shaped outputs

use crate::error::Result;
use crate::geometry::{decode, encode, for_each_leaf, Box2D, Coord, Dims, GeometryNode, Inspected, PointSeq};

/// Box of every vertex, read straight from the buffer; `None` when empty
pub fn compute_bbox(buf: &[u8]) -> Result<Option<Box2D>> {
    let mut extent: Option<[f64; 4]> = None;
    for_each_leaf(buf, &mut |leaf| {
        for seq in leaf.sequences() {
            for c in seq.iter() {
                let e = extent.get_or_insert([c.x, c.y, c.x, c.y]);
                e[0] = e[0].min(c.x);
                e[1] = e[1].min(c.y);
                e[2] = e[2].max(c.x);
                e[3] = e[3].max(c.y);
            }
        }
        Ok(())
    })?;
    Ok(extent.map(|e| Box2D::from_extent(e[0], e[1], e[2], e[3])))
}

pub fn has_bbox(buf: &[u8]) -> Result<bool> {
    Ok(Inspected::checked(buf)?.bbox().is_some())
}

/// The cached box when present, otherwise a computed one
pub fn to_box(buf: &[u8]) -> Result<Option<Box2D>> {
    match Inspected::checked(buf)?.bbox() {
        Some(b) => Ok(Some(b)),
        None => compute_bbox(buf),
    }
}

/// Re-encode with a freshly computed cached bbox (none for empty values)
pub fn add_bbox(buf: &[u8]) -> Result<Vec<u8>> {
    let node = decode(buf)?;
    let bbox = node.compute_bbox();
    encode(&node.with_bbox(bbox))
}

pub fn drop_bbox(buf: &[u8]) -> Result<Vec<u8>> {
    let node = decode(buf)?;
    encode(&node.with_bbox(None))
}

/// Polygon covering the 2D box of `buf`; empty values come back unchanged
pub fn envelope(buf: &[u8]) -> Result<Vec<u8>> {
    box_polygon(buf, 0.0)
}

/// Like [`envelope`], with the box grown by `d` on every side
pub fn expand(buf: &[u8], d: f64) -> Result<Vec<u8>> {
    box_polygon(buf, d)
}

fn box_polygon(buf: &[u8], d: f64) -> Result<Vec<u8>> {
    let node = decode(buf)?;
    let bbox = match node.bbox.or_else(|| node.compute_bbox()) {
        Some(b) if d != 0.0 => b.expand(d),
        Some(b) => b,
        None => return Ok(buf.to_vec()),
    };
    let (x0, y0, x1, y1) = (bbox.xmin as f64, bbox.ymin as f64, bbox.xmax as f64, bbox.ymax as f64);
    let ring = PointSeq::from_coords(
        Dims::Xy,
        &[
            Coord::xy(x0, y0),
            Coord::xy(x0, y1),
            Coord::xy(x1, y1),
            Coord::xy(x1, y0),
            Coord::xy(x0, y0),
        ],
    );
    let poly = GeometryNode::polygon(Dims::Xy, vec![ring])
        .with_srid(node.srid)
        .with_bbox(Some(bbox));
    encode(&poly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeomError;
    use crate::geometry::{GeomKind, Shape};

    fn line(pts: &[(f64, f64)]) -> GeometryNode {
        let coords: Vec<Coord> = pts.iter().map(|&(x, y)| Coord::xy(x, y)).collect();
        GeometryNode::line(PointSeq::from_coords(Dims::Xy, &coords))
    }

    #[test]
    fn test_compute_matches_tree() {
        let coll = GeometryNode::container(
            GeomKind::Collection,
            Dims::Xy,
            vec![line(&[(1.0, 5.0), (3.0, -2.0)]), GeometryNode::point(Dims::Xy, Coord::xy(-4.0, 0.0))],
        );
        let bytes = encode(&coll).unwrap();
        assert_eq!(compute_bbox(&bytes).unwrap(), coll.compute_bbox());
        assert_eq!(compute_bbox(&bytes).unwrap(), Some(Box2D::new(-4.0, -2.0, 3.0, 5.0)));
    }

    #[test]
    fn test_add_and_drop_bbox() {
        let bytes = encode(&line(&[(0.0, 0.0), (2.0, 1.0)])).unwrap();
        assert!(!has_bbox(&bytes).unwrap());
        let with = add_bbox(&bytes).unwrap();
        assert!(has_bbox(&with).unwrap());
        assert_eq!(to_box(&with).unwrap(), Some(Box2D::new(0.0, 0.0, 2.0, 1.0)));
        assert_eq!(drop_bbox(&with).unwrap(), bytes);
    }

    #[test]
    fn test_cached_box_wins() {
        let stale = Box2D::new(-9.0, -9.0, 9.0, 9.0);
        let bytes = encode(&line(&[(0.0, 0.0), (1.0, 1.0)]).with_bbox(Some(stale))).unwrap();
        assert_eq!(to_box(&bytes).unwrap(), Some(stale));
    }

    #[test]
    fn test_envelope_ring_order() {
        let bytes = encode(&line(&[(1.0, 2.0), (3.0, 5.0)]).with_srid(Some(4326))).unwrap();
        let env = decode(&envelope(&bytes).unwrap()).unwrap();
        assert_eq!(env.srid, Some(4326));
        assert_eq!(env.bbox, Some(Box2D::new(1.0, 2.0, 3.0, 5.0)));
        match env.shape {
            Shape::Polygon(rings) => assert_eq!(
                rings[0].ordinates(),
                &[1.0, 2.0, 1.0, 5.0, 3.0, 5.0, 3.0, 2.0, 1.0, 2.0]
            ),
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_expand_grows_box() {
        let bytes = encode(&GeometryNode::point(Dims::Xy, Coord::xy(0.0, 0.0))).unwrap();
        let out = decode(&expand(&bytes, 1.5).unwrap()).unwrap();
        assert_eq!(out.bbox, Some(Box2D::new(-1.5, -1.5, 1.5, 1.5)));
    }

    #[test]
    fn test_empty_envelope_is_unchanged() {
        let empty = encode(&GeometryNode::container(GeomKind::MultiPolygon, Dims::Xy, vec![])).unwrap();
        assert_eq!(envelope(&empty).unwrap(), empty);
        assert_eq!(compute_bbox(&empty).unwrap(), None);
    }

    #[test]
    fn test_cached_box_of_truncated_line_is_rejected() {
        // line with a cached box declaring 1000 points and holding none
        let mut bytes = encode(&line(&[(0.0, 0.0), (1.0, 1.0)]).with_bbox(Some(Box2D::new(0.0, 0.0, 1.0, 1.0)))).unwrap();
        bytes.truncate(1 + 16);
        bytes.extend_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(has_bbox(&bytes), Err(GeomError::MalformedGeometry(_))));
        assert!(matches!(to_box(&bytes), Err(GeomError::MalformedGeometry(_))));

        let mut trailing = encode(&line(&[(0.0, 0.0), (1.0, 1.0)])).unwrap();
        trailing.push(0);
        assert!(has_bbox(&trailing).is_err());
    }
}

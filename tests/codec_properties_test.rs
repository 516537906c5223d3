// End-to-end properties of the serialized format through the public API
use geoserial::geometry::Inspected;
use geoserial::ops;
use geoserial::{decode, encode, Box2D, Coord, Dims, GeomError, GeomKind, GeometryNode, PointSeq, Shape};

fn seq(dims: Dims, pts: &[(f64, f64)]) -> PointSeq {
    let coords: Vec<Coord> = pts.iter().map(|&(x, y)| Coord::new(x, y, 2.5, 9.0)).collect();
    PointSeq::from_coords(dims, &coords)
}

fn unit_square(dims: Dims) -> GeometryNode {
    GeometryNode::polygon(
        dims,
        vec![seq(dims, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])],
    )
}

/// A nested value touching every kind
fn everything(dims: Dims) -> GeometryNode {
    let pt = GeometryNode::point(dims, Coord::new(5.0, 6.0, 7.0, 8.0));
    let line = GeometryNode::line(seq(dims, &[(0.0, 0.0), (3.0, 4.0), (6.0, 0.0)]));
    let mpt = GeometryNode::container(GeomKind::MultiPoint, dims, vec![pt.clone(), pt.clone()]);
    let mline = GeometryNode::container(GeomKind::MultiLine, dims, vec![line.clone()]);
    let mpoly = GeometryNode::container(GeomKind::MultiPolygon, dims, vec![unit_square(dims)]);
    let inner = GeometryNode::container(GeomKind::Collection, dims, vec![pt, mline]);
    GeometryNode::container(
        GeomKind::Collection,
        dims,
        vec![line, unit_square(dims), mpt, mpoly, inner],
    )
    .with_srid(Some(26910))
    .with_bbox(Some(Box2D::new(0.0, 0.0, 6.0, 6.0)))
}

fn point_coords(buf: &[u8]) -> Vec<f64> {
    match decode(buf).unwrap().shape {
        Shape::Point(p) => p.ordinates().to_vec(),
        other => panic!("expected a point, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_every_dimensionality() {
        for dims in [Dims::Xy, Dims::Xyz, Dims::Xym, Dims::Xyzm] {
            let tree = everything(dims);
            let bytes = encode(&tree).unwrap();
            let decoded = decode(&bytes).unwrap();
            assert_eq!(decoded, tree, "round trip failed for {:?}", dims);
            // the encoder is canonical for trees it produced
            assert_eq!(encode(&decoded).unwrap(), bytes);
        }
    }

    #[test]
    fn test_force_zero_fills_and_drops() {
        let p2 = ops::make_point(3.0, 4.0).unwrap();
        assert_eq!(point_coords(&ops::force_3dz(&p2).unwrap()), vec![3.0, 4.0, 0.0]);
        assert_eq!(point_coords(&ops::force_3dm(&p2).unwrap()), vec![3.0, 4.0, 0.0]);
        assert_eq!(point_coords(&ops::force_4d(&p2).unwrap()), vec![3.0, 4.0, 0.0, 0.0]);

        let p4 = ops::make_point_4d(1.0, 2.0, 3.0, 4.0).unwrap();
        assert_eq!(point_coords(&ops::force_2d(&p4).unwrap()), vec![1.0, 2.0]);
        assert_eq!(point_coords(&ops::force_3dm(&p4).unwrap()), vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_force_2d_is_idempotent() {
        for dims in [Dims::Xy, Dims::Xyz, Dims::Xym, Dims::Xyzm] {
            let bytes = encode(&everything(dims)).unwrap();
            let once = ops::force_2d(&bytes).unwrap().into_owned();
            let twice = ops::force_2d(&once).unwrap().into_owned();
            assert_eq!(decode(&once).unwrap(), decode(&twice).unwrap());
            assert_eq!(ops::ndims(&twice).unwrap(), 2);
            assert_eq!(ops::srid(&twice).unwrap(), Some(26910));
        }
    }

    #[test]
    fn test_collect_type_promotion() {
        let a = ops::make_point(0.0, 0.0).unwrap();
        let b = ops::make_point(1.0, 1.0).unwrap();
        let out = ops::collect(Some(a.as_slice()), Some(b.as_slice())).unwrap().unwrap();
        assert_eq!(ops::geometry_type(&out).unwrap(), "MultiPoint");
        assert_eq!(ops::num_geometries(&out).unwrap(), 2);

        let line = encode(&GeometryNode::line(seq(Dims::Xy, &[(0.0, 0.0), (1.0, 0.0)]))).unwrap();
        let out = ops::collect(Some(a.as_slice()), Some(line.as_slice())).unwrap().unwrap();
        assert_eq!(ops::geometry_type(&out).unwrap(), "GeometryCollection");
        assert_eq!(ops::num_geometries(&out).unwrap(), 2);
    }

    #[test]
    fn test_collect_bbox_merge() {
        let a = encode(
            &GeometryNode::line(seq(Dims::Xy, &[(0.0, 0.0), (1.0, 1.0)])).with_bbox(Some(Box2D::new(0.0, 0.0, 1.0, 1.0))),
        )
        .unwrap();
        let b = encode(
            &GeometryNode::line(seq(Dims::Xy, &[(2.0, 2.0), (3.0, 3.0)])).with_bbox(Some(Box2D::new(2.0, 2.0, 3.0, 3.0))),
        )
        .unwrap();
        let merged = ops::collect(Some(a.as_slice()), Some(b.as_slice())).unwrap().unwrap();
        assert_eq!(Inspected::new(&merged).unwrap().bbox(), Some(Box2D::new(0.0, 0.0, 3.0, 3.0)));

        let bare = ops::drop_bbox(&b).unwrap();
        let merged = ops::collect(Some(a.as_slice()), Some(bare.as_slice())).unwrap().unwrap();
        assert!(!ops::has_bbox(&merged).unwrap());
    }

    #[test]
    fn test_collect_srid_mismatch_produces_nothing() {
        let a = encode(&GeometryNode::point(Dims::Xy, Coord::xy(0.0, 0.0)).with_srid(Some(4326))).unwrap();
        let b = encode(&GeometryNode::point(Dims::Xy, Coord::xy(0.0, 0.0)).with_srid(Some(26910))).unwrap();
        let result = ops::collect(Some(a.as_slice()), Some(b.as_slice()));
        assert!(matches!(result, Err(GeomError::IncompatibleReferenceSystems { .. })));
    }

    #[test]
    fn test_collect_absent_inputs() {
        assert_eq!(ops::collect(None, None).unwrap(), None);
        assert_eq!(ops::collect_many(&[]).unwrap(), None);
    }

    #[test]
    fn test_area_of_unit_square() {
        assert_eq!(ops::area(&encode(&unit_square(Dims::Xy)).unwrap()).unwrap(), 1.0);
        assert_eq!(ops::area(&ops::make_point(1.0, 1.0).unwrap()).unwrap(), 0.0);
        let line = encode(&GeometryNode::line(seq(Dims::Xy, &[(0.0, 0.0), (1.0, 0.0)]))).unwrap();
        assert_eq!(ops::area(&line).unwrap(), 0.0);
    }

    #[test]
    fn test_translate_shifts_cached_bbox() {
        let square = GeometryNode::polygon(
            Dims::Xy,
            vec![seq(Dims::Xy, &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)])],
        )
        .with_bbox(Some(Box2D::new(0.0, 0.0, 2.0, 2.0)));
        let moved = ops::translate(&encode(&square).unwrap(), 5.0, -1.0, 0.0).unwrap();
        assert_eq!(Inspected::new(&moved).unwrap().bbox(), Some(Box2D::new(5.0, -1.0, 7.0, 1.0)));
        assert_eq!(ops::compute_bbox(&moved).unwrap(), Some(Box2D::new(5.0, -1.0, 7.0, 1.0)));
    }

    #[test]
    fn test_inspector_agrees_with_decoder() {
        let tree = everything(Dims::Xyz);
        let bytes = encode(&tree).unwrap();
        let inspected = Inspected::new(&bytes).unwrap();
        assert_eq!(inspected.num_geometries(), tree.children().len());
        for (view, child) in inspected.children().zip(tree.children()) {
            let view = view.unwrap();
            assert_eq!(view.kind(), child.kind());
            assert_eq!(decode(view.bytes()).unwrap(), *child);
        }
        assert_eq!(ops::npoints(&bytes).unwrap(), tree.npoints());
    }

    #[test]
    fn test_every_truncation_fails_loudly() {
        let bytes = encode(&everything(Dims::Xym)).unwrap();
        for cut in 0..bytes.len() {
            let part = &bytes[..cut];
            assert!(decode(part).is_err(), "decode accepted {} bytes", cut);
            assert!(ops::force_4d(part).is_err(), "force_4d accepted {} bytes", cut);
            assert!(ops::translate(part, 1.0, 1.0, 1.0).is_err(), "translate accepted {} bytes", cut);
        }
    }
}

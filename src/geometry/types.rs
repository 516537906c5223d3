//! In-memory geometry tree
//!
//! [`GeometryNode`] is the owned form produced by the decoder and consumed by
//! the encoder. Every node keeps its own dimensionality, optional SRID and
//! optional cached bbox next to its [`Shape`].

use super::coords::{Coord, Dims, PointSeq};
use super::tag::{GeomKind, TypeTag};
use serde::Serialize;

/// Serialized size of a cached bbox (four f32)
pub const BOX2D_SIZE: usize = 16;

/// Cached 2D bounding box, single precision
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Box2D {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl Box2D {
    pub fn new(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    /// Box from double extents, rounded outward so it always contains them
    pub fn from_extent(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin: round_down(xmin),
            ymin: round_down(ymin),
            xmax: round_up(xmax),
            ymax: round_up(ymax),
        }
    }

    /// Component-wise min of mins, max of maxes
    pub fn merge(&self, other: &Box2D) -> Box2D {
        Box2D {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Box2D {
        Box2D::from_extent(
            self.xmin as f64 + dx,
            self.ymin as f64 + dy,
            self.xmax as f64 + dx,
            self.ymax as f64 + dy,
        )
    }

    pub fn expand(&self, d: f64) -> Box2D {
        Box2D::from_extent(
            self.xmin as f64 - d,
            self.ymin as f64 - d,
            self.xmax as f64 + d,
            self.ymax as f64 + d,
        )
    }
}

fn round_down(v: f64) -> f32 {
    let f = v as f32;
    if (f as f64) > v {
        next_down(f)
    } else {
        f
    }
}

fn round_up(v: f64) -> f32 {
    let f = v as f32;
    if (f as f64) < v {
        next_up(f)
    } else {
        f
    }
}

fn next_down(f: f32) -> f32 {
    if f.is_nan() || f == f32::NEG_INFINITY {
        return f;
    }
    if f == 0.0 {
        return -f32::from_bits(1);
    }
    let bits = f.to_bits();
    if f > 0.0 {
        f32::from_bits(bits - 1)
    } else {
        f32::from_bits(bits + 1)
    }
}

fn next_up(f: f32) -> f32 {
    -next_down(-f)
}

/// Payload of a geometry node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Shape {
    /// Exactly one tuple
    Point(PointSeq),
    Line(PointSeq),
    /// Ring 0 is the shell, the rest are holes
    Polygon(Vec<PointSeq>),
    MultiPoint(Vec<GeometryNode>),
    MultiLine(Vec<GeometryNode>),
    MultiPolygon(Vec<GeometryNode>),
    Collection(Vec<GeometryNode>),
}

/// A decoded geometry value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryNode {
    pub dims: Dims,
    pub srid: Option<i32>,
    pub bbox: Option<Box2D>,
    pub shape: Shape,
}

impl GeometryNode {
    pub fn point(dims: Dims, c: Coord) -> Self {
        Self::from_shape(dims, Shape::Point(PointSeq::from_coords(dims, &[c])))
    }

    pub fn line(points: PointSeq) -> Self {
        Self::from_shape(points.dims(), Shape::Line(points))
    }

    /// Rings are converted to `dims` when they differ
    pub fn polygon(dims: Dims, rings: Vec<PointSeq>) -> Self {
        let rings = rings.into_iter().map(|r| r.to_dims(dims)).collect();
        Self::from_shape(dims, Shape::Polygon(rings))
    }

    /// Container of the given kind (single kinds fall back to Collection)
    pub fn container(kind: GeomKind, dims: Dims, children: Vec<GeometryNode>) -> Self {
        let shape = match kind {
            GeomKind::MultiPoint => Shape::MultiPoint(children),
            GeomKind::MultiLine => Shape::MultiLine(children),
            GeomKind::MultiPolygon => Shape::MultiPolygon(children),
            _ => Shape::Collection(children),
        };
        Self::from_shape(dims, shape)
    }

    pub fn from_shape(dims: Dims, shape: Shape) -> Self {
        Self {
            dims,
            srid: None,
            bbox: None,
            shape,
        }
    }

    pub fn with_srid(mut self, srid: Option<i32>) -> Self {
        self.srid = srid;
        self
    }

    pub fn with_bbox(mut self, bbox: Option<Box2D>) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn kind(&self) -> GeomKind {
        match &self.shape {
            Shape::Point(_) => GeomKind::Point,
            Shape::Line(_) => GeomKind::Line,
            Shape::Polygon(_) => GeomKind::Polygon,
            Shape::MultiPoint(_) => GeomKind::MultiPoint,
            Shape::MultiLine(_) => GeomKind::MultiLine,
            Shape::MultiPolygon(_) => GeomKind::MultiPolygon,
            Shape::Collection(_) => GeomKind::Collection,
        }
    }

    pub fn tag(&self) -> TypeTag {
        TypeTag::new(self.kind(), self.dims, self.srid.is_some(), self.bbox.is_some())
    }

    /// Child values of a container, empty for single kinds
    pub fn children(&self) -> &[GeometryNode] {
        match &self.shape {
            Shape::MultiPoint(c) | Shape::MultiLine(c) | Shape::MultiPolygon(c) | Shape::Collection(c) => c,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<GeometryNode>> {
        match &mut self.shape {
            Shape::MultiPoint(c) | Shape::MultiLine(c) | Shape::MultiPolygon(c) | Shape::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_children(self) -> Vec<GeometryNode> {
        match self.shape {
            Shape::MultiPoint(c) | Shape::MultiLine(c) | Shape::MultiPolygon(c) | Shape::Collection(c) => c,
            _ => Vec::new(),
        }
    }

    /// Visit every point sequence (points, lines, rings) depth-first
    pub fn for_each_seq<F: FnMut(&PointSeq)>(&self, f: &mut F) {
        match &self.shape {
            Shape::Point(p) | Shape::Line(p) => f(p),
            Shape::Polygon(rings) => {
                for r in rings {
                    f(r);
                }
            }
            _ => {
                for child in self.children() {
                    child.for_each_seq(f);
                }
            }
        }
    }

    /// Mutable visit; polygon rings are passed with their ring index
    pub fn for_each_seq_mut<F: FnMut(&mut PointSeq, Option<usize>)>(&mut self, f: &mut F) {
        match &mut self.shape {
            Shape::Point(p) | Shape::Line(p) => f(p, None),
            Shape::Polygon(rings) => {
                for (i, r) in rings.iter_mut().enumerate() {
                    f(r, Some(i));
                }
            }
            Shape::MultiPoint(c) | Shape::MultiLine(c) | Shape::MultiPolygon(c) | Shape::Collection(c) => {
                for child in c.iter_mut() {
                    child.for_each_seq_mut(f);
                }
            }
        }
    }

    pub fn npoints(&self) -> usize {
        let mut n = 0;
        self.for_each_seq(&mut |s| n += s.len());
        n
    }

    /// Bounding box of all vertices, `None` when there are none
    pub fn compute_bbox(&self) -> Option<Box2D> {
        let mut extent: Option<[f64; 4]> = None;
        self.for_each_seq(&mut |seq| {
            for c in seq.iter() {
                let e = extent.get_or_insert([c.x, c.y, c.x, c.y]);
                e[0] = e[0].min(c.x);
                e[1] = e[1].min(c.y);
                e[2] = e[2].max(c.x);
                e[3] = e[3].max(c.y);
            }
        });
        extent.map(|e| Box2D::from_extent(e[0], e[1], e[2], e[3]))
    }

    /// Recursive copy at a new dimensionality
    pub fn to_dims(&self, dims: Dims) -> GeometryNode {
        let shape = match &self.shape {
            Shape::Point(p) => Shape::Point(p.to_dims(dims)),
            Shape::Line(p) => Shape::Line(p.to_dims(dims)),
            Shape::Polygon(rings) => Shape::Polygon(rings.iter().map(|r| r.to_dims(dims)).collect()),
            Shape::MultiPoint(c) => Shape::MultiPoint(c.iter().map(|g| g.to_dims(dims)).collect()),
            Shape::MultiLine(c) => Shape::MultiLine(c.iter().map(|g| g.to_dims(dims)).collect()),
            Shape::MultiPolygon(c) => Shape::MultiPolygon(c.iter().map(|g| g.to_dims(dims)).collect()),
            Shape::Collection(c) => Shape::Collection(c.iter().map(|g| g.to_dims(dims)).collect()),
        };
        GeometryNode {
            dims,
            srid: self.srid,
            bbox: self.bbox,
            shape,
        }
    }

    /// Strip the header fields a container owns for its children
    pub fn into_child(mut self) -> GeometryNode {
        self.srid = None;
        self.bbox = None;
        self
    }
}

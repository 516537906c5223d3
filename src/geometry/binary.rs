//! Binary codec for serialized geometry values
//!
//! Layout of one value (all multi-byte fields little-endian):
//! ```text
//! [tag: u8][bbox: 4 x f32]?[srid: i32]?[payload]
//! payload:
//!   Point        one tuple
//!   Line         [npoints: u32][tuples]
//!   Polygon      [nrings: u32] then per ring [npoints: u32][tuples]
//!   Multi*/Coll  [ngeoms: u32][child values without SRID]
//! ```
//! A tuple is 2, 3 or 4 f64 depending on the Z/M flags of the tag.

use super::coords::{Coord, Dims, PointSeq};
use super::inspect::{check_child, read_header};
use super::tag::{encode_tag, GeomKind, TypeTag};
use super::types::{Box2D, GeometryNode, Shape, BOX2D_SIZE};
use crate::config::MAX_NESTING_DEPTH;
use crate::error::{GeomError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Smallest possible child value: a tag and an empty count
const MIN_VALUE_SIZE: usize = 5;

/// Bounds-checked reader over a serialized buffer
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Borrow the next `n` bytes and advance past them
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                GeomError::malformed(format!(
                    "truncated buffer: need {} bytes at offset {}, {} available",
                    n,
                    self.pos,
                    self.remaining()
                ))
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    pub fn read_box(&mut self) -> Result<Box2D> {
        let b = self.take(BOX2D_SIZE)?;
        Ok(Box2D::new(
            LittleEndian::read_f32(&b[0..4]),
            LittleEndian::read_f32(&b[4..8]),
            LittleEndian::read_f32(&b[8..12]),
            LittleEndian::read_f32(&b[12..16]),
        ))
    }

    /// Read a count and borrow the `count * stride` tuples that follow
    pub fn take_tuples(&mut self, dims: Dims, count: usize) -> Result<&'a [u8]> {
        let n = count
            .checked_mul(dims.stride() * 8)
            .ok_or_else(|| GeomError::malformed(format!("point count {} overflows", count)))?;
        self.take(n)
    }
}

/// Append-only little-endian writer
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, v);
        self.buf.extend_from_slice(&b);
    }

    pub fn put_i32(&mut self, v: i32) {
        let mut b = [0u8; 4];
        LittleEndian::write_i32(&mut b, v);
        self.buf.extend_from_slice(&b);
    }

    pub fn put_f32(&mut self, v: f32) {
        let mut b = [0u8; 4];
        LittleEndian::write_f32(&mut b, v);
        self.buf.extend_from_slice(&b);
    }

    pub fn put_f64(&mut self, v: f64) {
        let mut b = [0u8; 8];
        LittleEndian::write_f64(&mut b, v);
        self.buf.extend_from_slice(&b);
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_box(&mut self, b: &Box2D) {
        self.put_f32(b.xmin);
        self.put_f32(b.ymin);
        self.put_f32(b.xmax);
        self.put_f32(b.ymax);
    }

    /// Tag, optional bbox, optional SRID
    pub fn put_header(&mut self, tag: TypeTag, bbox: Option<&Box2D>, srid: Option<i32>) {
        self.put_u8(encode_tag(tag));
        if let Some(b) = bbox.filter(|_| tag.has_bbox) {
            self.put_box(b);
        }
        if let Some(s) = srid.filter(|_| tag.has_srid) {
            self.put_i32(s);
        }
    }

    pub fn put_coord(&mut self, c: &Coord, dims: Dims) {
        self.put_f64(c.x);
        self.put_f64(c.y);
        if dims.has_z() {
            self.put_f64(c.z);
        }
        if dims.has_m() {
            self.put_f64(c.m);
        }
    }

    /// Tuples only, converted to `dims` when the sequence differs
    pub fn put_tuples(&mut self, seq: &PointSeq, dims: Dims) {
        if seq.dims() == dims {
            for &v in seq.ordinates() {
                self.put_f64(v);
            }
        } else {
            for c in seq.iter() {
                self.put_coord(&c, dims);
            }
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Decode a complete value; trailing bytes are an error
pub fn decode(buf: &[u8]) -> Result<GeometryNode> {
    let mut cur = Cursor::new(buf);
    let node = read_node(&mut cur, None, 0)?;
    if cur.remaining() != 0 {
        return Err(GeomError::malformed(format!(
            "{} trailing bytes after {} value",
            cur.remaining(),
            node.kind().name()
        )));
    }
    Ok(node)
}

fn read_seq(cur: &mut Cursor<'_>, dims: Dims, count: usize) -> Result<PointSeq> {
    let raw = cur.take_tuples(dims, count)?;
    let ords: Vec<f64> = raw.chunks_exact(8).map(LittleEndian::read_f64).collect();
    PointSeq::from_ordinates(dims, ords).ok_or_else(|| GeomError::malformed("ragged point sequence"))
}

fn read_node(cur: &mut Cursor<'_>, parent: Option<&TypeTag>, depth: usize) -> Result<GeometryNode> {
    if depth > MAX_NESTING_DEPTH {
        return Err(GeomError::malformed(format!("nesting deeper than {}", MAX_NESTING_DEPTH)));
    }
    let header = read_header(cur)?;
    if let Some(parent) = parent {
        check_child(parent, &header.tag)?;
    }
    let tag = header.tag;
    let dims = tag.dims();

    let shape = match tag.kind {
        GeomKind::Point => Shape::Point(read_seq(cur, dims, 1)?),
        GeomKind::Line => {
            let n = cur.read_u32()? as usize;
            Shape::Line(read_seq(cur, dims, n)?)
        }
        GeomKind::Polygon => {
            let nrings = cur.read_u32()? as usize;
            // every ring needs at least its 4-byte count
            let mut rings = Vec::with_capacity(nrings.min(cur.remaining() / 4));
            for _ in 0..nrings {
                let n = cur.read_u32()? as usize;
                rings.push(read_seq(cur, dims, n)?);
            }
            Shape::Polygon(rings)
        }
        kind => {
            let ngeoms = cur.read_u32()? as usize;
            let mut children = Vec::with_capacity(ngeoms.min(cur.remaining() / MIN_VALUE_SIZE));
            for _ in 0..ngeoms {
                children.push(read_node(cur, Some(&tag), depth + 1)?);
            }
            GeometryNode::container(kind, dims, children).shape
        }
    };

    Ok(GeometryNode {
        dims,
        srid: header.srid,
        bbox: header.bbox,
        shape,
    })
}

/// Encode a tree; sizes the output exactly before writing
pub fn encode(node: &GeometryNode) -> Result<Vec<u8>> {
    let size = node_size(node, None, 0)?;
    let mut w = Writer::with_capacity(size);
    write_node(&mut w, node, None);
    debug_assert_eq!(w.len(), size);
    Ok(w.into_inner())
}

/// Exact encoded size of a tree
pub fn encoded_size(node: &GeometryNode) -> Result<usize> {
    node_size(node, None, 0)
}

/// First pass: validates the tree and returns its byte size.
/// Children are written at the container's dimensionality, without SRID or bbox.
fn node_size(node: &GeometryNode, parent: Option<&TypeTag>, depth: usize) -> Result<usize> {
    if depth > MAX_NESTING_DEPTH {
        return Err(GeomError::unsupported(format!("nesting deeper than {}", MAX_NESTING_DEPTH)));
    }
    let tag = child_tag(node, parent);
    if let Some(parent) = parent {
        if let Some(member) = parent.kind.member() {
            if tag.kind != member {
                return Err(GeomError::unsupported(format!(
                    "{} cannot hold a {}",
                    parent.kind.name(),
                    tag.kind.name()
                )));
            }
        }
    }
    let tuple = tag.dims().stride() * 8;
    let mut size = 1 + tag.header_extra();
    match &node.shape {
        Shape::Point(p) => {
            if p.len() != 1 {
                return Err(GeomError::unsupported(format!("point holds {} tuples", p.len())));
            }
            size += tuple;
        }
        Shape::Line(p) => size += 4 + p.len() * tuple,
        Shape::Polygon(rings) => {
            size += 4;
            for r in rings {
                size += 4 + r.len() * tuple;
            }
        }
        _ => {
            size += 4;
            for child in node.children() {
                size += node_size(child, Some(&tag), depth + 1)?;
            }
        }
    }
    Ok(size)
}

fn child_tag(node: &GeometryNode, parent: Option<&TypeTag>) -> TypeTag {
    match parent {
        None => node.tag(),
        Some(p) => node.tag().with_dims(p.dims()).bare(),
    }
}

fn write_node(w: &mut Writer, node: &GeometryNode, parent: Option<&TypeTag>) {
    let tag = child_tag(node, parent);
    let dims = tag.dims();
    w.put_header(tag, node.bbox.as_ref(), node.srid);
    match &node.shape {
        Shape::Point(p) => w.put_tuples(p, dims),
        Shape::Line(p) => {
            w.put_u32(p.len() as u32);
            w.put_tuples(p, dims);
        }
        Shape::Polygon(rings) => {
            w.put_u32(rings.len() as u32);
            for r in rings {
                w.put_u32(r.len() as u32);
                w.put_tuples(r, dims);
            }
        }
        _ => {
            let children = node.children();
            w.put_u32(children.len() as u32);
            for child in children {
                write_node(w, child, Some(&tag));
            }
        }
    }
}

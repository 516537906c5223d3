//! Structural inspector
//!
//! Walks a serialized value without building a tree. [`Inspected`] exposes a
//! restartable, lazy sequence of [`ChildView`]s (offset + length into the
//! source buffer); [`LeafView`] and [`SeqView`] read coordinates straight
//! from the bytes. All offsets are bounds-checked through [`Cursor`].

use super::binary::Cursor;
use super::coords::{path_length, signed_ring_area, Coord, Dims};
use super::tag::{decode_tag, GeomKind, TypeTag};
use super::types::Box2D;
use crate::config::MAX_NESTING_DEPTH;
use crate::error::{GeomError, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Decoded fixed header of a value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    pub tag: TypeTag,
    pub bbox: Option<Box2D>,
    pub srid: Option<i32>,
}

pub fn read_header(cur: &mut Cursor<'_>) -> Result<Header> {
    let tag = decode_tag(cur.read_u8()?)?;
    let bbox = if tag.has_bbox { Some(cur.read_box()?) } else { None };
    let srid = if tag.has_srid { Some(cur.read_i32()?) } else { None };
    Ok(Header { tag, bbox, srid })
}

/// Rules a child value must follow inside its container
pub(crate) fn check_child(parent: &TypeTag, child: &TypeTag) -> Result<()> {
    if child.has_srid {
        return Err(GeomError::malformed(format!(
            "{} member carries its own SRID",
            parent.kind.name()
        )));
    }
    if child.dims() != parent.dims() {
        return Err(GeomError::malformed(format!(
            "{:?} member inside {:?} {}",
            child.dims(),
            parent.dims(),
            parent.kind.name()
        )));
    }
    if let Some(member) = parent.kind.member() {
        if child.kind != member {
            return Err(GeomError::malformed(format!(
                "{} member of a {}",
                child.kind.name(),
                parent.kind.name()
            )));
        }
    }
    Ok(())
}

/// Exact byte size of the value starting at `offset`, validating its structure
pub fn value_size(buf: &[u8], offset: usize) -> Result<usize> {
    let mut cur = Cursor::at(buf, offset);
    skip_value(&mut cur, None, 0)?;
    Ok(cur.position() - offset)
}

fn skip_value(cur: &mut Cursor<'_>, parent: Option<&TypeTag>, depth: usize) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(GeomError::malformed(format!("nesting deeper than {}", MAX_NESTING_DEPTH)));
    }
    let header = read_header(cur)?;
    if let Some(parent) = parent {
        check_child(parent, &header.tag)?;
    }
    let dims = header.tag.dims();
    match header.tag.kind {
        GeomKind::Point => {
            cur.take_tuples(dims, 1)?;
        }
        GeomKind::Line => {
            let n = cur.read_u32()? as usize;
            cur.take_tuples(dims, n)?;
        }
        GeomKind::Polygon => {
            let nrings = cur.read_u32()?;
            for _ in 0..nrings {
                let n = cur.read_u32()? as usize;
                cur.take_tuples(dims, n)?;
            }
        }
        _ => {
            let ngeoms = cur.read_u32()?;
            for _ in 0..ngeoms {
                skip_value(cur, Some(&header.tag), depth + 1)?;
            }
        }
    }
    Ok(())
}

/// Validate that `buf` holds exactly one well-formed value
pub fn validate(buf: &[u8]) -> Result<()> {
    let size = value_size(buf, 0)?;
    if size != buf.len() {
        return Err(GeomError::malformed(format!(
            "value occupies {} bytes of a {}-byte buffer",
            size,
            buf.len()
        )));
    }
    Ok(())
}

/// Header-level view of a serialized value
#[derive(Debug, Clone, Copy)]
pub struct Inspected<'a> {
    buf: &'a [u8],
    header: Header,
    /// Child count for containers
    ngeoms: u32,
    /// Offset of the first child (containers) or of the payload
    body: usize,
}

impl<'a> Inspected<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let header = read_header(&mut cur)?;
        let ngeoms = if header.tag.kind.is_container() {
            cur.read_u32()?
        } else {
            1
        };
        Ok(Self {
            buf,
            header,
            ngeoms,
            body: cur.position(),
        })
    }

    /// Like [`Inspected::new`], but the whole buffer must be one well-formed value
    pub fn checked(buf: &'a [u8]) -> Result<Self> {
        validate(buf)?;
        Self::new(buf)
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.buf
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn tag(&self) -> TypeTag {
        self.header.tag
    }

    pub fn kind(&self) -> GeomKind {
        self.header.tag.kind
    }

    pub fn srid(&self) -> Option<i32> {
        self.header.srid
    }

    pub fn bbox(&self) -> Option<Box2D> {
        self.header.bbox
    }

    /// Child count of a container, 1 for single kinds
    pub fn num_geometries(&self) -> usize {
        self.ngeoms as usize
    }

    /// Lazy child sequence; each call starts over from the first child.
    /// Single kinds yield the value itself once.
    pub fn children(&self) -> ChildIter<'a> {
        if self.kind().is_container() {
            ChildIter {
                buf: self.buf,
                parent: Some(self.tag()),
                pos: self.body,
                remaining: self.ngeoms,
            }
        } else {
            ChildIter {
                buf: self.buf,
                parent: None,
                pos: 0,
                remaining: 1,
            }
        }
    }

    /// Random access to one child; walks the preceding siblings
    pub fn child(&self, index: usize) -> Result<ChildView<'a>> {
        if index >= self.num_geometries() {
            return Err(GeomError::malformed(format!(
                "child index {} out of range for {} with {} members",
                index,
                self.kind().name(),
                self.ngeoms
            )));
        }
        self.children()
            .nth(index)
            .unwrap_or_else(|| Err(GeomError::malformed("child sequence ended early")))
    }
}

/// Location of one child value inside its container's buffer
#[derive(Debug, Clone, Copy)]
pub struct ChildView<'a> {
    buf: &'a [u8],
    pub tag: TypeTag,
    pub offset: usize,
    pub len: usize,
}

impl<'a> ChildView<'a> {
    pub fn kind(&self) -> GeomKind {
        self.tag.kind
    }

    /// The child's own bytes, a standalone value without SRID
    pub fn bytes(&self) -> &'a [u8] {
        &self.buf[self.offset..self.offset + self.len]
    }

    pub fn inspect(&self) -> Result<Inspected<'a>> {
        Inspected::new(self.bytes())
    }
}

/// Iterator behind [`Inspected::children`]; stops after the first error
#[derive(Debug, Clone)]
pub struct ChildIter<'a> {
    buf: &'a [u8],
    parent: Option<TypeTag>,
    pos: usize,
    remaining: u32,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = Result<ChildView<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let mut cur = Cursor::at(self.buf, self.pos);
        let tag = match cur.read_u8().and_then(decode_tag) {
            Ok(tag) => tag,
            Err(e) => {
                self.remaining = 0;
                return Some(Err(e));
            }
        };
        let checked = match &self.parent {
            Some(parent) => check_child(parent, &tag),
            None => Ok(()),
        };
        let len = match checked.and_then(|_| value_size(self.buf, self.pos)) {
            Ok(len) => len,
            Err(e) => {
                self.remaining = 0;
                return Some(Err(e));
            }
        };
        let view = ChildView {
            buf: self.buf,
            tag,
            offset: self.pos,
            len,
        };
        self.pos += len;
        Some(Ok(view))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

/// Borrowed run of tuples read lazily from the buffer
#[derive(Debug, Clone, Copy)]
pub struct SeqView<'a> {
    dims: Dims,
    data: &'a [u8],
}

impl<'a> SeqView<'a> {
    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.data.len() / (self.dims.stride() * 8)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize) -> Coord {
        let size = self.dims.stride() * 8;
        let t = &self.data[i * size..(i + 1) * size];
        let mut ords = [0.0f64; 4];
        for (k, o) in ords.iter_mut().take(self.dims.stride()).enumerate() {
            *o = LittleEndian::read_f64(&t[k * 8..k * 8 + 8]);
        }
        Coord::from_ordinates(&ords, self.dims)
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord> + 'a {
        let view = *self;
        (0..view.len()).map(move |i| view.get(i))
    }

    pub fn length2d(&self) -> f64 {
        path_length(self.iter(), false)
    }

    /// 3D when Z is present
    pub fn length(&self) -> f64 {
        path_length(self.iter(), self.dims.has_z())
    }

    pub fn signed_area(&self) -> f64 {
        signed_ring_area(self.iter())
    }
}

/// A Point, Line or Polygon read in place
#[derive(Debug, Clone, Copy)]
pub struct LeafView<'a> {
    pub tag: TypeTag,
    /// Payload bytes after the header (validated)
    payload: &'a [u8],
}

impl<'a> LeafView<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<Self> {
        let mut cur = Cursor::new(buf);
        let header = read_header(&mut cur)?;
        if header.tag.kind.is_container() {
            return Err(GeomError::unsupported(format!(
                "{} is not a single geometry",
                header.tag.kind.name()
            )));
        }
        let start = cur.position();
        let size = value_size(buf, 0)?;
        Ok(Self {
            tag: header.tag,
            payload: &buf[start..size],
        })
    }

    pub fn kind(&self) -> GeomKind {
        self.tag.kind
    }

    pub fn dims(&self) -> Dims {
        self.tag.dims()
    }

    /// Point tuple, line vertices, or each polygon ring in order
    pub fn sequences(&self) -> SeqIter<'a> {
        let mut cur = Cursor::new(self.payload);
        let remaining = match self.tag.kind {
            GeomKind::Polygon => cur.read_u32().unwrap_or(0),
            _ => 1,
        };
        SeqIter {
            cur,
            kind: self.tag.kind,
            dims: self.tag.dims(),
            remaining,
        }
    }

    pub fn npoints(&self) -> usize {
        self.sequences().map(|s| s.len()).sum()
    }

    pub fn nrings(&self) -> usize {
        match self.tag.kind {
            GeomKind::Polygon => self.sequences().count(),
            _ => 0,
        }
    }
}

/// Sequences of a [`LeafView`]
#[derive(Debug, Clone)]
pub struct SeqIter<'a> {
    cur: Cursor<'a>,
    kind: GeomKind,
    dims: Dims,
    remaining: u32,
}

impl<'a> Iterator for SeqIter<'a> {
    type Item = SeqView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let count = match self.kind {
            GeomKind::Point => 1,
            _ => self.cur.read_u32().ok()? as usize,
        };
        let data = self.cur.take_tuples(self.dims, count).ok()?;
        Some(SeqView { dims: self.dims, data })
    }
}

/// Depth-first visit of every Point/Line/Polygon leaf
pub fn for_each_leaf<'a, F>(buf: &'a [u8], f: &mut F) -> Result<()>
where
    F: FnMut(&LeafView<'a>) -> Result<()>,
{
    visit_leaves(buf, f, 0)
}

fn visit_leaves<'a, F>(buf: &'a [u8], f: &mut F, depth: usize) -> Result<()>
where
    F: FnMut(&LeafView<'a>) -> Result<()>,
{
    if depth > MAX_NESTING_DEPTH {
        return Err(GeomError::malformed(format!("nesting deeper than {}", MAX_NESTING_DEPTH)));
    }
    let inspected = Inspected::new(buf)?;
    if !inspected.kind().is_container() {
        return f(&LeafView::parse(buf)?);
    }
    for child in inspected.children() {
        let child = child?;
        visit_leaves(child.bytes(), f, depth + 1)?;
    }
    Ok(())
}

/// Byte offsets a coordinate-rewriting pass needs, gathered without mutation
#[derive(Debug, Default)]
pub(crate) struct Layout {
    /// (offset, dims, npoints) for every tuple run
    pub seqs: Vec<(usize, Dims, usize)>,
    /// Offsets of every cached bbox (top-level and tolerated child boxes)
    pub boxes: Vec<usize>,
}

pub(crate) fn layout(buf: &[u8]) -> Result<Layout> {
    validate(buf)?;
    let mut out = Layout::default();
    let mut cur = Cursor::new(buf);
    collect_layout(&mut cur, &mut out)?;
    Ok(out)
}

fn collect_layout(cur: &mut Cursor<'_>, out: &mut Layout) -> Result<()> {
    let start = cur.position();
    let header = read_header(cur)?;
    if header.tag.has_bbox {
        out.boxes.push(start + 1);
    }
    let dims = header.tag.dims();
    match header.tag.kind {
        GeomKind::Point => {
            out.seqs.push((cur.position(), dims, 1));
            cur.take_tuples(dims, 1)?;
        }
        GeomKind::Line => {
            let n = cur.read_u32()? as usize;
            out.seqs.push((cur.position(), dims, n));
            cur.take_tuples(dims, n)?;
        }
        GeomKind::Polygon => {
            let nrings = cur.read_u32()?;
            for _ in 0..nrings {
                let n = cur.read_u32()? as usize;
                out.seqs.push((cur.position(), dims, n));
                cur.take_tuples(dims, n)?;
            }
        }
        _ => {
            let ngeoms = cur.read_u32()?;
            for _ in 0..ngeoms {
                collect_layout(cur, out)?;
            }
        }
    }
    Ok(())
}

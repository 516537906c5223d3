//! Collection algebra
//!
//! Wrapping single values into Multi/Collection containers and merging several
//! values into one. The container always owns SRID and cached bbox; wrapped
//! children are written bare.

use crate::error::{check_same_srid, Result};
use crate::geometry::{decode, encode, encode_tag, read_header, validate, Box2D, Cursor, GeomKind, GeometryNode, Writer};
use std::borrow::Cow;

/// Wrap Point/Line/Polygon into its Multi form; containers pass through
pub fn force_multi(buf: &[u8]) -> Result<Cow<'_, [u8]>> {
    validate(buf)?;
    let kind = read_header(&mut Cursor::new(buf))?.tag.kind;
    match kind.multi() {
        Some(multi) => Ok(Cow::Owned(wrap_single(buf, multi)?)),
        None => Ok(Cow::Borrowed(buf)),
    }
}

/// Wrap or re-tag any value as a generic Collection
pub fn force_collection(buf: &[u8]) -> Result<Cow<'_, [u8]>> {
    validate(buf)?;
    let tag = read_header(&mut Cursor::new(buf))?.tag;
    match tag.kind {
        GeomKind::Collection => Ok(Cow::Borrowed(buf)),
        GeomKind::MultiPoint | GeomKind::MultiLine | GeomKind::MultiPolygon => {
            tracing::debug!(from = tag.kind.name(), size = buf.len(), "re-tagging as collection");
            let mut out = buf.to_vec();
            out[0] = encode_tag(tag.with_kind(GeomKind::Collection));
            Ok(Cow::Owned(out))
        }
        _ => Ok(Cow::Owned(wrap_single(buf, GeomKind::Collection)?)),
    }
}

/// Stream a single value into a one-child container of `kind`.
/// Header fields move to the container; the child keeps only its payload.
fn wrap_single(buf: &[u8], kind: GeomKind) -> Result<Vec<u8>> {
    let mut cur = Cursor::new(buf);
    let header = read_header(&mut cur)?;
    let payload = &buf[cur.position()..];

    let mut w = Writer::with_capacity(buf.len() + 5);
    w.put_header(header.tag.with_kind(kind), header.bbox.as_ref(), header.srid);
    w.put_u32(1);
    w.put_u8(encode_tag(header.tag.bare()));
    w.put_bytes(payload);

    tracing::debug!(
        from = header.tag.kind.name(),
        to = kind.name(),
        input = buf.len(),
        written = w.len(),
        "wrapped single value"
    );
    Ok(w.into_inner())
}

/// Merge two optional values.
///
/// One absent input returns the other unchanged; two absent inputs are an
/// explicit empty result.
pub fn collect(a: Option<&[u8]>, b: Option<&[u8]>) -> Result<Option<Vec<u8>>> {
    match (a, b) {
        (None, None) => Ok(None),
        (Some(only), None) | (None, Some(only)) => {
            validate(only)?;
            Ok(Some(only.to_vec()))
        }
        (Some(a), Some(b)) => merge(&[a, b]),
    }
}

/// Merge any number of optional values; absent entries are skipped.
/// Unlike [`collect`], a single present value is still wrapped in a container.
pub fn collect_many(inputs: &[Option<&[u8]>]) -> Result<Option<Vec<u8>>> {
    let present: Vec<&[u8]> = inputs.iter().flatten().copied().collect();
    tracing::debug!(inputs = inputs.len(), present = present.len(), "collect many");
    merge(&present)
}

fn merge(values: &[&[u8]]) -> Result<Option<Vec<u8>>> {
    let mut nodes = Vec::with_capacity(values.len());
    for v in values {
        nodes.push(decode(v)?);
    }
    let first = match nodes.first() {
        Some(first) => first,
        None => return Ok(None),
    };
    let srid = first.srid;
    for n in &nodes[1..] {
        check_same_srid(srid, n.srid)?;
    }

    let first_kind = first.kind();
    let kind = if nodes.iter().all(|n| n.kind() == first_kind) {
        first_kind.multi().unwrap_or(GeomKind::Collection)
    } else {
        GeomKind::Collection
    };
    let dims = nodes.iter().skip(1).fold(first.dims, |d, n| d.union(n.dims));
    let bbox = merge_boxes(nodes.iter().map(|n| n.bbox));

    let children: Vec<GeometryNode> = nodes.into_iter().map(|n| n.into_child().to_dims(dims)).collect();
    let count = children.len();
    let out = GeometryNode::container(kind, dims, children)
        .with_srid(srid)
        .with_bbox(bbox);
    let bytes = encode(&out)?;

    tracing::debug!(
        kind = kind.name(),
        members = count,
        has_bbox = bbox.is_some(),
        size = bytes.len(),
        "collected values"
    );
    Ok(Some(bytes))
}

/// Union of all boxes, or `None` as soon as one is missing
fn merge_boxes(mut boxes: impl Iterator<Item = Option<Box2D>>) -> Option<Box2D> {
    let first = boxes.next()??;
    boxes.try_fold(first, |acc, b| b.map(|b| acc.merge(&b)))
}

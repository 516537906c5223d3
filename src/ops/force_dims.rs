//! Dimension-forcing rewriters
//!
//! Buffer-to-buffer rewrites that stream through the source and emit every
//! tuple at the target stride. Added axes are written as exactly 0.0 and
//! dropped axes are discarded. Headers keep their kind, SRID and bbox; only
//! the Z/M bits change.

use crate::config::MAX_NESTING_DEPTH;
use crate::error::{GeomError, Result};
use crate::geometry::{decode_tag, read_header, validate, Coord, Cursor, Dims, GeomKind, Writer};
use std::borrow::Cow;

pub fn force_2d(buf: &[u8]) -> Result<Cow<'_, [u8]>> {
    force_dims(buf, Dims::Xy)
}

pub fn force_3dz(buf: &[u8]) -> Result<Cow<'_, [u8]>> {
    force_dims(buf, Dims::Xyz)
}

pub fn force_3dm(buf: &[u8]) -> Result<Cow<'_, [u8]>> {
    force_dims(buf, Dims::Xym)
}

pub fn force_4d(buf: &[u8]) -> Result<Cow<'_, [u8]>> {
    force_dims(buf, Dims::Xyzm)
}

/// Rewrite `buf` at the target dimensionality.
///
/// A value already at `target` is returned borrowed. Otherwise the output is
/// allocated for the worst case and its length is the exact written size.
pub fn force_dims(buf: &[u8], target: Dims) -> Result<Cow<'_, [u8]>> {
    validate(buf)?;
    let first = buf
        .first()
        .copied()
        .ok_or_else(|| GeomError::malformed("empty buffer"))?;
    let source = decode_tag(first)?.dims();
    if source == target {
        return Ok(Cow::Borrowed(buf));
    }

    let capacity = buf.len() * source.stride().max(target.stride()) / source.stride();
    let mut w = Writer::with_capacity(capacity);
    let mut cur = Cursor::new(buf);
    rewrite_value(&mut cur, &mut w, target, 0)?;

    tracing::debug!(
        from = ?source,
        to = ?target,
        input = buf.len(),
        allocated = capacity,
        written = w.len(),
        "forced dimensionality"
    );
    Ok(Cow::Owned(w.into_inner()))
}

fn rewrite_value(cur: &mut Cursor<'_>, w: &mut Writer, target: Dims, depth: usize) -> Result<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(GeomError::malformed(format!("nesting deeper than {}", MAX_NESTING_DEPTH)));
    }
    let header = read_header(cur)?;
    let source = header.tag.dims();
    w.put_header(header.tag.with_dims(target), header.bbox.as_ref(), header.srid);

    match header.tag.kind {
        GeomKind::Point => copy_tuples(cur, w, source, target, 1)?,
        GeomKind::Line => {
            let n = cur.read_u32()?;
            w.put_u32(n);
            copy_tuples(cur, w, source, target, n as usize)?;
        }
        GeomKind::Polygon => {
            let nrings = cur.read_u32()?;
            w.put_u32(nrings);
            for _ in 0..nrings {
                let n = cur.read_u32()?;
                w.put_u32(n);
                copy_tuples(cur, w, source, target, n as usize)?;
            }
        }
        kind => {
            let ngeoms = cur.read_u32()?;
            w.put_u32(ngeoms);
            let before = w.len();
            for i in 0..ngeoms {
                rewrite_value(cur, w, target, depth + 1)?;
                tracing::trace!(kind = kind.name(), member = i, written = w.len() - before, "rewrote member");
            }
        }
    }
    Ok(())
}

fn copy_tuples(cur: &mut Cursor<'_>, w: &mut Writer, source: Dims, target: Dims, count: usize) -> Result<()> {
    let stride = source.stride();
    let mut ords = [0.0f64; 4];
    for _ in 0..count {
        for o in ords.iter_mut().take(stride) {
            *o = cur.read_f64()?;
        }
        let c = Coord::from_ordinates(&ords, source);
        w.put_coord(&c, target);
    }
    Ok(())
}

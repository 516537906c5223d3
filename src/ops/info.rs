//! Introspection of serialized values
//!
//! Header-level queries validate the value, then read only the header;
//! `mem_size`, `summary` and `same` walk the whole value.

use crate::error::Result;
use crate::geometry::{decode, value_size, GeometryNode, Inspected, Shape};
use std::fmt::Write;

/// Coordinate count per tuple: 2, 3 or 4
pub fn ndims(buf: &[u8]) -> Result<usize> {
    Ok(Inspected::checked(buf)?.tag().dims().stride())
}

/// 0 = 2D, 1 = 3DM, 2 = 3DZ, 3 = 4D
pub fn zmflag(buf: &[u8]) -> Result<u8> {
    Ok(Inspected::checked(buf)?.tag().dims().zm_flag())
}

pub fn geometry_type(buf: &[u8]) -> Result<&'static str> {
    Ok(Inspected::checked(buf)?.kind().name())
}

pub fn srid(buf: &[u8]) -> Result<Option<i32>> {
    Ok(Inspected::checked(buf)?.srid())
}

/// Child count of a container, 1 for single kinds
pub fn num_geometries(buf: &[u8]) -> Result<usize> {
    Ok(Inspected::checked(buf)?.num_geometries())
}

/// A container without children
pub fn is_empty(buf: &[u8]) -> Result<bool> {
    Ok(num_geometries(buf)? == 0)
}

/// Exact size of the value at the start of `buf`.
///
/// The buffer length is what the host declared; a mismatch is logged.
pub fn mem_size(buf: &[u8]) -> Result<usize> {
    let size = value_size(buf, 0)?;
    if size != buf.len() {
        tracing::warn!(declared = buf.len(), computed = size, "declared length disagrees with value size");
    }
    Ok(size)
}

/// Indented, one line per node
pub fn summary(buf: &[u8]) -> Result<String> {
    let node = decode(buf)?;
    let mut out = String::new();
    describe(&node, 0, &mut out);
    Ok(out)
}

fn describe(node: &GeometryNode, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    let mut flags = Vec::new();
    match (node.dims.has_z(), node.dims.has_m()) {
        (true, true) => flags.push("ZM".to_string()),
        (true, false) => flags.push("Z".to_string()),
        (false, true) => flags.push("M".to_string()),
        (false, false) => {}
    }
    if node.bbox.is_some() {
        flags.push("B".to_string());
    }
    if let Some(s) = node.srid {
        flags.push(format!("S={}", s));
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!("[{}]", flags.join(","))
    };
    let _ = write!(out, "{}{}{}", pad, node.kind().name(), flags);

    match &node.shape {
        Shape::Point(_) => {
            let _ = writeln!(out);
        }
        Shape::Line(p) => {
            let _ = writeln!(out, " with {} points", p.len());
        }
        Shape::Polygon(rings) => {
            let _ = writeln!(out, " with {} rings", rings.len());
            for (i, r) in rings.iter().enumerate() {
                let _ = writeln!(out, "{}  ring {} has {} points", pad, i, r.len());
            }
        }
        _ => {
            let children = node.children();
            let _ = writeln!(out, " with {} elements", children.len());
            for child in children {
                describe(child, depth + 1, out);
            }
        }
    }
}

/// Same kind, dimensionality and coordinates; bbox and SRID are ignored
pub fn same(a: &[u8], b: &[u8]) -> Result<bool> {
    let (ia, ib) = (Inspected::checked(a)?, Inspected::checked(b)?);
    if ia.kind() != ib.kind() || ia.tag().dims() != ib.tag().dims() {
        return Ok(false);
    }
    Ok(bare(decode(a)?) == bare(decode(b)?))
}

fn bare(node: GeometryNode) -> GeometryNode {
    let mut node = node.with_srid(None).with_bbox(None);
    if let Some(children) = node.children_mut() {
        let stripped: Vec<GeometryNode> = children.drain(..).map(bare).collect();
        *children = stripped;
    }
    node
}

/// Version of this library
pub fn lib_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

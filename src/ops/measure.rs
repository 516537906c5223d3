//! Geometric aggregators
//!
//! Single-pass reducers over the leaves of a serialized value. Leaves of a
//! kind the measure does not apply to contribute zero.

use crate::error::Result;
use crate::geometry::{for_each_leaf, GeomKind, LeafView};

fn sum_leaves<F>(buf: &[u8], mut f: F) -> Result<f64>
where
    F: FnMut(&LeafView<'_>) -> f64,
{
    let mut total = 0.0;
    for_each_leaf(buf, &mut |leaf| {
        total += f(leaf);
        Ok(())
    })?;
    Ok(total)
}

/// Planar area: each polygon adds its shell and subtracts its holes
pub fn area(buf: &[u8]) -> Result<f64> {
    sum_leaves(buf, |leaf| {
        if leaf.kind() != GeomKind::Polygon {
            return 0.0;
        }
        leaf.sequences()
            .enumerate()
            .map(|(i, ring)| {
                let a = ring.signed_area().abs();
                if i == 0 {
                    a
                } else {
                    -a
                }
            })
            .sum()
    })
}

/// Length of all lines, ignoring Z
pub fn length2d(buf: &[u8]) -> Result<f64> {
    sum_leaves(buf, |leaf| match leaf.kind() {
        GeomKind::Line => leaf.sequences().map(|s| s.length2d()).sum(),
        _ => 0.0,
    })
}

/// Length of all lines, in 3D when Z is present
pub fn length(buf: &[u8]) -> Result<f64> {
    sum_leaves(buf, |leaf| match leaf.kind() {
        GeomKind::Line => leaf.sequences().map(|s| s.length()).sum(),
        _ => 0.0,
    })
}

/// Length of all polygon rings, ignoring Z
pub fn perimeter2d(buf: &[u8]) -> Result<f64> {
    sum_leaves(buf, |leaf| match leaf.kind() {
        GeomKind::Polygon => leaf.sequences().map(|s| s.length2d()).sum(),
        _ => 0.0,
    })
}

/// Length of all polygon rings, in 3D when Z is present
pub fn perimeter(buf: &[u8]) -> Result<f64> {
    sum_leaves(buf, |leaf| match leaf.kind() {
        GeomKind::Polygon => leaf.sequences().map(|s| s.length()).sum(),
        _ => 0.0,
    })
}

pub fn npoints(buf: &[u8]) -> Result<usize> {
    let mut n = 0;
    for_each_leaf(buf, &mut |leaf| {
        n += leaf.npoints();
        Ok(())
    })?;
    Ok(n)
}

/// Ring count over every polygon at any depth
pub fn nrings(buf: &[u8]) -> Result<usize> {
    let mut n = 0;
    for_each_leaf(buf, &mut |leaf| {
        n += leaf.nrings();
        Ok(())
    })?;
    Ok(n)
}

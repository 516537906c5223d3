//! Operations over serialized geometry values
//!
//! Every function here takes serialized bytes and returns either new bytes or
//! a scalar.
//!
//! # Submodules
//! - `force_dims` - Streaming dimensionality rewrites
//! - `collection` - Multi/Collection wrapping and collect
//! - `measure` - Area, length, perimeter and count aggregators
//! - `distance` - Minimum planar distance and point predicates
//! - `translate` - In-place coordinate shift
//! - `construct` - Point, line and polygon constructors
//! - `edit` - Reverse, right-hand rule, segmentize
//! - `bbox` - Cached bbox management, envelope, expand
//! - `info` - Introspection and summaries

mod force_dims;
mod collection;
mod measure;
mod distance;
mod translate;
mod construct;
mod edit;
mod bbox;
mod info;

pub use force_dims::{force_2d, force_3dm, force_3dz, force_4d, force_dims};
pub use collection::{collect, collect_many, force_collection, force_multi};
pub use measure::{area, length, length2d, nrings, npoints, perimeter, perimeter2d};
pub use distance::{min_distance2d, point_inside_circle, point_segment_distance, segment_distance};
pub use translate::{translate, translate_in_place};
pub use construct::{
    add_point,
    line_from_multipoint,
    make_line,
    make_line_many,
    make_point,
    make_point_3dm,
    make_point_3dz,
    make_point_4d,
    make_polygon,
};
pub use edit::{force_rhr, reverse, segmentize2d};
pub use bbox::{add_bbox, compute_bbox, drop_bbox, envelope, expand, has_bbox, to_box};
pub use info::{
    geometry_type,
    is_empty,
    lib_version,
    mem_size,
    ndims,
    num_geometries,
    same,
    srid,
    summary,
    zmflag,
};

use crate::error::{GeomError, Result};
use crate::geometry::{decode, GeomKind, GeometryNode};

/// Decode a value that must be of one particular kind
pub(crate) fn decode_kind(buf: &[u8], wanted: GeomKind) -> Result<GeometryNode> {
    let node = decode(buf)?;
    if node.kind() != wanted {
        return Err(GeomError::unsupported(format!(
            "expected {}, got {}",
            wanted.name(),
            node.kind().name()
        )));
    }
    Ok(node)
}

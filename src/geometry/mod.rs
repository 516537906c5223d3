//! Serialized geometry format
//!
//! This module defines the compact binary encoding shared by every operation
//! in the crate and the tools to read it.
//!
//! # Submodules
//! - `tag` - One-byte type descriptor (dimensionality, SRID/bbox flags, kind)
//! - `coords` - Coordinate tuples and fixed-stride point sequences
//! - `types` - Owned geometry tree and cached bbox
//! - `binary` - Decoder/encoder between bytes and the tree
//! - `inspect` - Lazy, non-allocating walker over serialized values

mod tag;
mod coords;
mod types;
mod binary;
mod inspect;

pub use tag::{
    GeomKind,
    TypeTag,
    decode_tag,
    encode_tag,
};

pub use coords::{
    Dims,
    Coord,
    PointSeq,
    path_length,
    signed_ring_area,
};

pub use types::{
    Box2D,
    GeometryNode,
    Shape,
    BOX2D_SIZE,
};

pub use binary::{
    Cursor,
    Writer,
    decode,
    encode,
    encoded_size,
};

pub use inspect::{
    Header,
    Inspected,
    ChildView,
    ChildIter,
    LeafView,
    SeqView,
    SeqIter,
    read_header,
    value_size,
    validate,
    for_each_leaf,
};

pub(crate) use inspect::layout;

//! Type tag codec
//!
//! The first byte of every serialized value packs the dimensionality flags,
//! the SRID/bbox presence flags and the geometry kind:
//!
//! ```text
//! bit 0      has M
//! bit 1      has Z
//! bit 2      has SRID
//! bit 3      has cached bbox
//! bits 4..7  kind (1..=7)
//! ```

use super::coords::Dims;
use crate::error::{GeomError, Result};
use serde::Serialize;

const M_BIT: u8 = 0x01;
const Z_BIT: u8 = 0x02;
const SRID_BIT: u8 = 0x04;
const BBOX_BIT: u8 = 0x08;
const KIND_SHIFT: u8 = 4;

/// Geometry category stored in the upper nibble of the tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GeomKind {
    Point = 1,
    Line = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLine = 5,
    MultiPolygon = 6,
    Collection = 7,
}

impl GeomKind {
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            1 => GeomKind::Point,
            2 => GeomKind::Line,
            3 => GeomKind::Polygon,
            4 => GeomKind::MultiPoint,
            5 => GeomKind::MultiLine,
            6 => GeomKind::MultiPolygon,
            7 => GeomKind::Collection,
            other => return Err(GeomError::malformed(format!("unknown geometry kind {}", other))),
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Multi*/Collection kinds hold child values
    pub fn is_container(self) -> bool {
        self.code() >= 4
    }

    /// The Multi form of a single kind; containers have none
    pub fn multi(self) -> Option<GeomKind> {
        match self {
            GeomKind::Point => Some(GeomKind::MultiPoint),
            GeomKind::Line => Some(GeomKind::MultiLine),
            GeomKind::Polygon => Some(GeomKind::MultiPolygon),
            _ => None,
        }
    }

    /// The only child kind a Multi* accepts (`None` for Collection and single kinds)
    pub fn member(self) -> Option<GeomKind> {
        match self {
            GeomKind::MultiPoint => Some(GeomKind::Point),
            GeomKind::MultiLine => Some(GeomKind::Line),
            GeomKind::MultiPolygon => Some(GeomKind::Polygon),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GeomKind::Point => "Point",
            GeomKind::Line => "LineString",
            GeomKind::Polygon => "Polygon",
            GeomKind::MultiPoint => "MultiPoint",
            GeomKind::MultiLine => "MultiLineString",
            GeomKind::MultiPolygon => "MultiPolygon",
            GeomKind::Collection => "GeometryCollection",
        }
    }
}

/// Unpacked type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTag {
    pub has_z: bool,
    pub has_m: bool,
    pub has_srid: bool,
    pub has_bbox: bool,
    pub kind: GeomKind,
}

impl TypeTag {
    pub fn new(kind: GeomKind, dims: Dims, has_srid: bool, has_bbox: bool) -> Self {
        Self {
            has_z: dims.has_z(),
            has_m: dims.has_m(),
            has_srid,
            has_bbox,
            kind,
        }
    }

    pub fn dims(&self) -> Dims {
        Dims::from_flags(self.has_z, self.has_m)
    }

    pub fn with_dims(self, dims: Dims) -> Self {
        Self {
            has_z: dims.has_z(),
            has_m: dims.has_m(),
            ..self
        }
    }

    pub fn with_kind(self, kind: GeomKind) -> Self {
        Self { kind, ..self }
    }

    /// Same tag with the SRID and bbox flags cleared (child-of-container form)
    pub fn bare(self) -> Self {
        Self {
            has_srid: false,
            has_bbox: false,
            ..self
        }
    }

    /// Bytes occupied by the optional header fields after the tag byte
    pub fn header_extra(&self) -> usize {
        let mut size = 0;
        if self.has_bbox {
            size += super::types::BOX2D_SIZE;
        }
        if self.has_srid {
            size += 4;
        }
        size
    }
}

pub fn decode_tag(byte: u8) -> Result<TypeTag> {
    Ok(TypeTag {
        has_m: byte & M_BIT != 0,
        has_z: byte & Z_BIT != 0,
        has_srid: byte & SRID_BIT != 0,
        has_bbox: byte & BBOX_BIT != 0,
        kind: GeomKind::from_code(byte >> KIND_SHIFT)?,
    })
}

pub fn encode_tag(tag: TypeTag) -> u8 {
    let mut byte = tag.kind.code() << KIND_SHIFT;
    if tag.has_m {
        byte |= M_BIT;
    }
    if tag.has_z {
        byte |= Z_BIT;
    }
    if tag.has_srid {
        byte |= SRID_BIT;
    }
    if tag.has_bbox {
        byte |= BBOX_BIT;
    }
    byte
}

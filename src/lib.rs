//! Compact binary geometry format and the codec/transcoder engine over it
//!
//! A serialized value is a one-byte type tag, an optional cached 2D bbox, an
//! optional SRID and a kind-specific payload. The crate reads, rewrites,
//! merges and measures such values, mostly without building a tree.
//!
//! # Module Structure
//! - `geometry` - Type tag, point tuples, tree types, codec, inspector
//! - `ops` - Dimension rewrites, collection algebra, measures, edits
//! - `host` - JSON request/response boundary for an embedding runtime
//! - `config` - Host-side settings
//! - `error` - Error taxonomy
//!
//! # Example
//! ```
//! use geoserial::ops;
//!
//! let a = ops::make_point(0.0, 0.0)?;
//! let b = ops::make_point(3.0, 4.0)?;
//! let multi = ops::collect(Some(a.as_slice()), Some(b.as_slice()))?.expect("two inputs");
//! assert_eq!(ops::geometry_type(&multi)?, "MultiPoint");
//! assert_eq!(ops::min_distance2d(&a, &b)?, Some(5.0));
//! # Ok::<(), geoserial::GeomError>(())
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod host;
pub mod ops;

// Re-export key types for convenience
pub use config::{CoreConfig, MAX_NESTING_DEPTH};
pub use error::{ErrorKind, GeomError, Result};
pub use geometry::{decode, encode, Box2D, Coord, Dims, GeomKind, GeometryNode, PointSeq, Shape};

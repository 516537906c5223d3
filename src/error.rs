//! Error types for the geometry codec
//!
//! Every fallible operation in the crate returns [`GeomError`]. The variants
//! mirror the three failure kinds a host can observe; [`ErrorKind`] is the
//! stable, serializable tag carried across the host boundary.

use serde::Serialize;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, GeomError>;

/// Failure raised by a codec, rewrite, merge or measure operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// Tag/payload mismatch, truncated buffer, unknown kind
    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),

    /// Operands carry different reference systems
    #[error("operation on mixed SRID geometries ({} != {})", fmt_srid(.left), fmt_srid(.right))]
    IncompatibleReferenceSystems {
        left: Option<i32>,
        right: Option<i32>,
    },

    /// The operation does not accept this kind of input
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
}

/// Machine-readable error tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    MalformedGeometry,
    IncompatibleReferenceSystems,
    UnsupportedInput,
}

impl GeomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeomError::MalformedGeometry(_) => ErrorKind::MalformedGeometry,
            GeomError::IncompatibleReferenceSystems { .. } => ErrorKind::IncompatibleReferenceSystems,
            GeomError::UnsupportedInput(_) => ErrorKind::UnsupportedInput,
        }
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        GeomError::MalformedGeometry(msg.into())
    }

    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        GeomError::UnsupportedInput(msg.into())
    }
}

fn fmt_srid(srid: &Option<i32>) -> String {
    match srid {
        Some(s) => s.to_string(),
        None => "unknown".to_string(),
    }
}

/// Fail unless both reference systems are equal ("unknown" only equals "unknown")
pub fn check_same_srid(left: Option<i32>, right: Option<i32>) -> Result<()> {
    if left != right {
        return Err(GeomError::IncompatibleReferenceSystems { left, right });
    }
    Ok(())
}

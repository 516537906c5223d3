//! Host boundary
//!
//! A host runtime calls into the core with JSON requests naming a function and
//! its arguments; buffers travel base64-encoded. Results and failures come
//! back as tagged JSON responses, never as panics.
//!
//! # Module Structure
//! - `protocol` - Request/response types, error codes, buffer encoding
//! - `dispatch` - Function routing

pub mod dispatch;
pub mod protocol;

pub use dispatch::{handle, handle_json};
pub use protocol::{decode_buffer, encode_buffer, error_codes, ErrorResponse, Request, Response};

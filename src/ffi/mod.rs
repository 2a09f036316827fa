//! Hand-written FFmpeg C bindings (no bindgen)
//!
//! Only the surface the single-frame VP8 pipeline needs: codec lookup and
//! context lifecycle, frames, packets, swscale and error text.
//! All FFmpeg structs are opaque - fields are reached via the thin C accessor library.

pub mod accessors;
pub mod avcodec;
pub mod avutil;
pub mod error;
pub mod swscale;
pub mod types;

// Static zlib for FFmpeg's compressed-stream helpers
use libz_sys as _;

pub use error::{check_error, FFmpegError, FFmpegResult};
pub use types::*;

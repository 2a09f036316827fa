#![deny(clippy::all)]

//! Single-frame VP8 encoding and decoding for Node.js
//!
//! This crate encodes one still image into one VP8 key frame and decodes one
//! VP8 frame back into RGB24 pixels, using FFmpeg linked statically.

// FFmpeg C bindings (hand-written, no bindgen)
pub mod ffi;

// Safe codec wrappers (RAII) and the transcoding pipeline
pub mod codec;

// JavaScript API surface (NAPI functions)
pub mod addon;

// Re-export the JavaScript API at crate root
pub use addon::{
    // Frame transcoding
    decode_frame, decode_frame_async, encode_frame, encode_frame_async, DecodeFrameResult,
    EncodeFrameOptions, EncodeFrameResult,
    // Introspection
    get_ffmpeg_version, has_codec, hello, list_codecs, CodecAvailability, CodecInfo,
};

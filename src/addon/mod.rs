//! JavaScript surface (napi-rs functions and plain result objects)

pub mod error;
pub mod frame;
pub mod introspection;

pub use frame::{
  decode_frame, decode_frame_async, encode_frame, encode_frame_async, DecodeFrameResult,
  EncodeFrameOptions, EncodeFrameResult,
};
pub use introspection::{
  get_ffmpeg_version, has_codec, hello, list_codecs, CodecAvailability, CodecInfo,
};

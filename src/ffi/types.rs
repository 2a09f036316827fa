//! Core FFmpeg type definitions
//!
//! All FFmpeg structs are opaque (zero-sized) to avoid version-specific layout dependencies.
//! Field access is done via the thin C accessor library in accessors.c

use std::marker::PhantomData;
use std::os::raw::c_int;

// ============================================================================
// Codec IDs
// ============================================================================

/// Codec IDs used by this crate
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVCodecID {
  None = 0,
  Vp8 = 139,
}

impl AVCodecID {
  /// Get the raw FFmpeg codec ID value
  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }

  /// Short name used in error messages
  pub fn label(&self) -> &'static str {
    match self {
      AVCodecID::None => "none",
      AVCodecID::Vp8 => "VP8",
    }
  }
}

// ============================================================================
// Pixel Formats
// ============================================================================

/// Pixel formats the pipeline converts between
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVPixelFormat {
  None = -1,
  /// Planar YUV 4:2:0 (I420), the format VP8 works in
  Yuv420p = 0,
  /// Packed RGB 8:8:8
  Rgb24 = 2,
}

impl AVPixelFormat {
  /// Map a raw `AVFrame::format` / `AVCodecContext::pix_fmt` value.
  /// Formats outside this crate's subset become `None`.
  pub fn from_raw(raw: c_int) -> Self {
    match raw {
      0 => Self::Yuv420p,
      2 => Self::Rgb24,
      _ => Self::None,
    }
  }

  /// Get the raw FFmpeg pixel format value
  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }
}

// ============================================================================
// Media Type
// ============================================================================

/// `AVMediaType` as reported by codec descriptors
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AVMediaType {
  Unknown = -1,
  Video = 0,
  Audio = 1,
  Data = 2,
  Subtitle = 3,
  Attachment = 4,
}

impl AVMediaType {
  pub fn from_raw(raw: c_int) -> Self {
    match raw {
      0 => Self::Video,
      1 => Self::Audio,
      2 => Self::Data,
      3 => Self::Subtitle,
      4 => Self::Attachment,
      _ => Self::Unknown,
    }
  }
}

// ============================================================================
// Picture Type
// ============================================================================

/// Picture/frame type
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AVPictureType {
  None = 0,
  /// Intra (key frame)
  I = 1,
  P = 2,
  B = 3,
}

// ============================================================================
// Opaque FFmpeg Types
// ============================================================================

/// Opaque AVCodec structure (codec implementation descriptor)
#[repr(C)]
pub struct AVCodec {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVCodecContext structure (encoder/decoder instance)
#[repr(C)]
pub struct AVCodecContext {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVFrame structure (uncompressed video data)
#[repr(C)]
pub struct AVFrame {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVPacket structure (compressed data)
#[repr(C)]
pub struct AVPacket {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque SwsContext structure (software scaler context)
#[repr(C)]
pub struct SwsContext {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVDictionary structure (key-value options)
#[repr(C)]
pub struct AVDictionary {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

// ============================================================================
// Constants
// ============================================================================

/// Packet flags
pub mod pkt_flag {
  use std::os::raw::c_int;

  pub const KEY: c_int = 0x0001;
}

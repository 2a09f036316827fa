//! Safe single-frame VP8 pipeline on top of FFmpeg
//!
//! RAII wrappers around FFmpeg's C structures plus the transcoding
//! pipeline built from them. Every native resource is released by `Drop`,
//! so error returns at any stage never leak.

pub mod frame;
pub mod init;
pub mod layout;
pub(crate) mod live;
pub mod packet;
pub mod registry;
pub mod scaler;
pub mod session;
pub mod transcode;

pub use frame::Frame;
pub use layout::{OwnedImage, PixelLayout, RawImage};
pub use packet::Packet;
pub use scaler::Scaler;
pub use session::{DecoderSession, EncoderSession, SessionState};
pub use transcode::{decode_frame, encode_frame, DecodedFrame, EncodeRequest, EncodedFrame};

use crate::ffi::{AVPixelFormat, FFmpegError};
use std::fmt;

/// Default target bit rate for `encodeFrame` (bits per second)
pub const DEFAULT_BIT_RATE: u64 = 500_000;

/// Nominal frame rate the encoder is configured with
pub const NOMINAL_FRAME_RATE: i32 = 30;

/// Preferred VP8 encoder implementation
pub const PREFERRED_VP8_ENCODER: &str = "libvpx";

/// Encoder configuration
#[derive(Debug, Clone)]
pub struct EncoderConfig {
  /// Video width in pixels
  pub width: u32,
  /// Video height in pixels
  pub height: u32,
  /// Pixel format the encoder is fed
  pub pixel_format: AVPixelFormat,
  /// Target bitrate in bits per second
  pub bitrate: u64,
  /// Frames per second (numerator)
  pub framerate_num: i32,
  /// Frames per second (denominator)
  pub framerate_den: i32,
  /// Group of pictures size (keyframe interval)
  pub gop_size: i32,
  /// Maximum B-frames between non-B frames
  pub max_b_frames: i32,
}

impl EncoderConfig {
  /// Single-frame VP8 settings: 30 fps nominal, GOP 30, no reordering, I420
  pub fn vp8(width: u32, height: u32, bitrate: u64) -> Self {
    Self {
      width,
      height,
      bitrate,
      ..Self::default()
    }
  }
}

impl Default for EncoderConfig {
  fn default() -> Self {
    Self {
      width: 0,
      height: 0,
      pixel_format: AVPixelFormat::Yuv420p,
      bitrate: DEFAULT_BIT_RATE,
      framerate_num: NOMINAL_FRAME_RATE,
      framerate_den: 1,
      gop_size: NOMINAL_FRAME_RATE,
      max_b_frames: 0,
    }
  }
}

/// Type of codec (encoder or decoder)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecType {
  Encoder,
  Decoder,
}

impl fmt::Display for CodecType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CodecType::Encoder => f.write_str("encoder"),
      CodecType::Decoder => f.write_str("decoder"),
    }
  }
}

/// Caller-visible failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  InvalidArgument,
  InvalidBufferSize,
  CodecUnavailable,
  CodecOpen,
  ConversionContext,
  Submit,
  Drain,
}

impl ErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ErrorKind::InvalidArgument => "InvalidArgumentError",
      ErrorKind::InvalidBufferSize => "InvalidBufferSizeError",
      ErrorKind::CodecUnavailable => "CodecUnavailableError",
      ErrorKind::CodecOpen => "CodecOpenError",
      ErrorKind::ConversionContext => "ConversionContextError",
      ErrorKind::Submit => "SubmitError",
      ErrorKind::Drain => "DrainError",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Codec error type
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
  #[error("{0}")]
  InvalidArgument(String),

  #[error("{}", layout::size_mismatch_message(.layout, .width, .height, .expected, .actual))]
  InvalidBufferSize {
    layout: PixelLayout,
    width: u32,
    height: u32,
    expected: usize,
    actual: usize,
  },

  #[error("No {codec_type} found for {codec}")]
  CodecUnavailable {
    codec_type: CodecType,
    codec: &'static str,
  },

  #[error("{context}: {source}")]
  CodecOpen {
    context: &'static str,
    source: FFmpegError,
  },

  #[error("{0}")]
  ConversionContext(String),

  #[error("{context}: {source}")]
  Submit {
    context: &'static str,
    source: FFmpegError,
  },

  #[error("{context}: {source}")]
  Drain {
    context: &'static str,
    source: FFmpegError,
  },
}

impl CodecError {
  /// Category used by the boundary to name the failure
  pub fn kind(&self) -> ErrorKind {
    match self {
      CodecError::InvalidArgument(_) => ErrorKind::InvalidArgument,
      CodecError::InvalidBufferSize { .. } => ErrorKind::InvalidBufferSize,
      CodecError::CodecUnavailable { .. } => ErrorKind::CodecUnavailable,
      CodecError::CodecOpen { .. } => ErrorKind::CodecOpen,
      CodecError::ConversionContext(_) => ErrorKind::ConversionContext,
      CodecError::Submit { .. } => ErrorKind::Submit,
      CodecError::Drain { .. } => ErrorKind::Drain,
    }
  }
}

pub type CodecResult<T> = Result<T, CodecError>;

#[cfg(test)]
pub(crate) fn init_test_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
    )
    .with_test_writer()
    .try_init();
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ffi::error::AVERROR_INVALIDDATA;

  #[test]
  fn test_vp8_encoder_config() {
    let config = EncoderConfig::vp8(16, 8, 250_000);
    assert_eq!(config.width, 16);
    assert_eq!(config.height, 8);
    assert_eq!(config.bitrate, 250_000);
    assert_eq!(config.pixel_format, AVPixelFormat::Yuv420p);
    assert_eq!(config.framerate_num, 30);
    assert_eq!(config.gop_size, 30);
    assert_eq!(config.max_b_frames, 0);
  }

  #[test]
  fn test_error_kinds() {
    let err = CodecError::CodecUnavailable {
      codec_type: CodecType::Encoder,
      codec: "VP8",
    };
    assert_eq!(err.kind(), ErrorKind::CodecUnavailable);
    assert_eq!(err.to_string(), "No encoder found for VP8");

    let err = CodecError::Submit {
      context: "Failed to send packet",
      source: FFmpegError::from_code(AVERROR_INVALIDDATA),
    };
    assert_eq!(err.kind().as_str(), "SubmitError");
    assert!(err.to_string().starts_with("Failed to send packet: Invalid data"));
  }
}

//! FFmpeg error handling
//!
//! Provides error codes, error conversion, and result types.

use std::ffi::CStr;
use std::fmt;
use std::os::raw::{c_char, c_int};

// ============================================================================
// FFmpeg Error Codes
// ============================================================================

/// End of file / stream reached
pub const AVERROR_EOF: c_int = fferrtag(b'E', b'O', b'F', b' ');

/// Invalid data found
pub const AVERROR_INVALIDDATA: c_int = fferrtag(b'I', b'N', b'D', b'A');

// POSIX error codes (negated) - FFmpeg negates errno values, so these are
// platform specific

/// Resource temporarily unavailable (try again)
/// Linux: EAGAIN = 11, macOS: EAGAIN = 35
#[cfg(target_os = "macos")]
pub const AVERROR_EAGAIN: c_int = -35;

#[cfg(not(target_os = "macos"))]
pub const AVERROR_EAGAIN: c_int = -11;

/// Out of memory
pub const AVERROR_ENOMEM: c_int = -12;

/// Invalid argument
pub const AVERROR_EINVAL: c_int = -22;

/// Create FFmpeg error tag from 4 bytes
const fn fferrtag(a: u8, b: u8, c: u8, d: u8) -> c_int {
  -((a as c_int) | ((b as c_int) << 8) | ((c as c_int) << 16) | ((d as c_int) << 24))
}

// ============================================================================
// FFmpeg Error Type
// ============================================================================

/// FFmpeg error with code and message
#[derive(Clone, PartialEq, Eq)]
pub struct FFmpegError {
  /// Error code (negative)
  pub code: c_int,
  /// Human-readable message
  pub message: String,
}

impl FFmpegError {
  /// Create error from FFmpeg error code, using `av_strerror` for the text
  pub fn from_code(code: c_int) -> Self {
    Self {
      code,
      message: get_error_message(code),
    }
  }

  /// Create error with custom message
  pub fn new(code: c_int, message: impl Into<String>) -> Self {
    Self {
      code,
      message: message.into(),
    }
  }

  /// A native allocator returned NULL
  pub fn out_of_memory(what: &str) -> Self {
    Self::new(AVERROR_ENOMEM, format!("failed to allocate {}", what))
  }

  /// Check if this is EAGAIN (resource temporarily unavailable)
  #[inline]
  pub fn is_eagain(&self) -> bool {
    self.code == AVERROR_EAGAIN
  }

  /// Check if this is EOF
  #[inline]
  pub fn is_eof(&self) -> bool {
    self.code == AVERROR_EOF
  }

  /// EAGAIN or EOF: the codec has nothing to hand out
  #[inline]
  pub fn would_block(&self) -> bool {
    self.is_eagain() || self.is_eof()
  }
}

impl fmt::Debug for FFmpegError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FFmpegError")
      .field("code", &self.code)
      .field("message", &self.message)
      .finish()
  }
}

impl fmt::Display for FFmpegError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} (FFmpeg error {})", self.message, self.code)
  }
}

impl std::error::Error for FFmpegError {}

/// Result type for FFmpeg operations
pub type FFmpegResult<T> = Result<T, FFmpegError>;

// ============================================================================
// Error Checking
// ============================================================================

/// Check FFmpeg return code and convert to Result
///
/// Returns Ok with the value if >= 0, Err with FFmpegError if < 0
#[inline]
pub fn check_error(ret: c_int) -> FFmpegResult<c_int> {
  if ret < 0 {
    Err(FFmpegError::from_code(ret))
  } else {
    Ok(ret)
  }
}

/// Get error message for an FFmpeg error code
pub fn get_error_message(code: c_int) -> String {
  let mut buf = [0 as c_char; 256];
  unsafe {
    if super::avutil::av_strerror(code, buf.as_mut_ptr(), buf.len()) < 0 {
      return format!("Error number {} occurred", code);
    }
    CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_codes() {
    assert!(AVERROR_EOF < 0);
    assert!(AVERROR_EAGAIN < 0);
    assert!(AVERROR_EINVAL < 0);
    assert_ne!(AVERROR_EOF, AVERROR_INVALIDDATA);
  }

  #[test]
  fn test_check_error() {
    assert_eq!(check_error(0), Ok(0));
    assert_eq!(check_error(100), Ok(100));
    assert!(check_error(-1).is_err());
    assert!(check_error(AVERROR_EAGAIN).is_err());
  }

  #[test]
  fn test_native_text_is_attached() {
    let err = FFmpegError::from_code(AVERROR_INVALIDDATA);
    assert_eq!(err.code, AVERROR_INVALIDDATA);
    assert!(err.message.contains("Invalid data"), "got {:?}", err.message);
    assert!(err.to_string().contains(&err.code.to_string()));
  }

  #[test]
  fn test_would_block() {
    assert!(FFmpegError::from_code(AVERROR_EAGAIN).would_block());
    assert!(FFmpegError::from_code(AVERROR_EOF).would_block());
    assert!(!FFmpegError::out_of_memory("AVFrame").would_block());
  }
}

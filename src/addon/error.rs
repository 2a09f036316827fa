//! Error translation for the JavaScript boundary
//!
//! Every failure crosses the boundary as a JavaScript `Error` whose message is
//! prefixed with the failure kind, e.g.
//! `InvalidBufferSizeError: Invalid RGB24 buffer size: expected 300 bytes (10x10x3), got 299`.
//! Caller mistakes carry `Status::InvalidArg`; everything that went wrong
//! inside FFmpeg carries `Status::GenericFailure`.

use crate::codec::{CodecError, ErrorKind};
use napi::bindgen_prelude::*;

/// Build a boundary error with the `"<Kind>: <message>"` reason
pub fn kind_error(kind: ErrorKind, message: &str) -> Error {
  let status = match kind {
    ErrorKind::InvalidArgument | ErrorKind::InvalidBufferSize => Status::InvalidArg,
    _ => Status::GenericFailure,
  };
  Error::new(status, format!("{}: {}", kind.as_str(), message))
}

/// Shorthand for argument validation failures
pub fn invalid_argument(message: &str) -> Error {
  kind_error(ErrorKind::InvalidArgument, message)
}

pub fn to_napi_error(err: CodecError) -> Error {
  kind_error(err.kind(), &err.to_string())
}

impl From<CodecError> for Error {
  fn from(err: CodecError) -> Self {
    to_napi_error(err)
  }
}

// ============================================================================
// Numeric Argument Helpers
// ============================================================================
// JavaScript numbers arrive as f64. These reject NaN, infinities, fractions,
// non-positive values and values beyond the target integer range.

fn enforce_positive_integer(value: f64, field_name: &str, max: f64) -> Result<f64> {
  if value.is_nan() {
    return Err(invalid_argument(&format!("{} cannot be NaN", field_name)));
  }
  if value.is_infinite() {
    return Err(invalid_argument(&format!("{} cannot be Infinity", field_name)));
  }
  if value.fract() != 0.0 {
    return Err(invalid_argument(&format!(
      "{} must be an integer, got {}",
      field_name, value
    )));
  }
  if value <= 0.0 {
    return Err(invalid_argument(&format!(
      "{} must be greater than 0, got {}",
      field_name, value
    )));
  }
  if value > max {
    return Err(invalid_argument(&format!(
      "{} is out of range, got {}",
      field_name, value
    )));
  }
  Ok(value)
}

/// Validate an image dimension. FFmpeg stores these as C `int`, so the
/// range stops at `i32::MAX`.
pub fn enforce_dimension(value: f64, field_name: &str) -> Result<u32> {
  enforce_positive_integer(value, field_name, i32::MAX as f64).map(|v| v as u32)
}

/// Validate a positive integer up to 2^53 (bit rates)
pub fn enforce_positive_u64(value: f64, field_name: &str) -> Result<u64> {
  // Largest integer a JavaScript number represents exactly
  const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
  enforce_positive_integer(value, field_name, MAX_SAFE_INTEGER).map(|v| v as u64)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::{CodecType, PixelLayout};

  #[test]
  fn test_reason_carries_kind_prefix() {
    let err = to_napi_error(CodecError::InvalidBufferSize {
      layout: PixelLayout::Rgb24,
      width: 10,
      height: 10,
      expected: 300,
      actual: 299,
    });
    assert_eq!(err.status, Status::InvalidArg);
    assert_eq!(
      err.reason,
      "InvalidBufferSizeError: Invalid RGB24 buffer size: expected 300 bytes (10x10x3), got 299"
    );
  }

  #[test]
  fn test_native_failures_are_generic() {
    let err: Error = CodecError::CodecUnavailable {
      codec_type: CodecType::Decoder,
      codec: "VP8",
    }
    .into();
    assert_eq!(err.status, Status::GenericFailure);
    assert_eq!(err.reason, "CodecUnavailableError: No decoder found for VP8");
  }

  #[test]
  fn test_enforce_dimension() {
    assert_eq!(enforce_dimension(640.0, "width").unwrap(), 640);
    assert_eq!(enforce_dimension(2_147_483_647.0, "width").unwrap(), i32::MAX as u32);

    // 2^31 and u32::MAX would wrap negative once handed to FFmpeg
    for bad in [0.0, -1.0, 1.5, f64::NAN, f64::INFINITY, 2_147_483_648.0, 4_294_967_295.0, 5e9] {
      let err = enforce_dimension(bad, "width").unwrap_err();
      assert_eq!(err.status, Status::InvalidArg);
      assert!(err.reason.starts_with("InvalidArgumentError: width"), "{}", err.reason);
    }
  }

  #[test]
  fn test_enforce_positive_u64() {
    assert_eq!(enforce_positive_u64(500_000.0, "bitRate").unwrap(), 500_000);
    assert!(enforce_positive_u64(0.0, "bitRate").is_err());
    assert!(enforce_positive_u64(1e300, "bitRate").is_err());
  }
}

//! `encodeFrame` / `decodeFrame` and their Promise-returning variants

use napi::bindgen_prelude::*;
use napi_derive::napi;

use super::error::{enforce_dimension, enforce_positive_u64};
use crate::codec::{self, EncodeRequest, PixelLayout, DEFAULT_BIT_RATE};

/// Options for `encodeFrame`
#[napi(object)]
pub struct EncodeFrameOptions {
  /// Image width in pixels (positive integer)
  pub width: f64,
  /// Image height in pixels (positive integer)
  pub height: f64,
  /// Target bit rate in bits per second (default 500000)
  pub bit_rate: Option<f64>,
  /// `"RGB24"` (default) or `"I420"`
  pub layout: Option<String>,
}

#[napi(object)]
pub struct EncodeFrameResult {
  /// VP8 bitstream of exactly one frame
  pub data: Buffer,
  pub is_keyframe: bool,
  /// Byte length of `data`
  pub size: u32,
}

// `Buffer` has no `Debug`; tests need it for `Result::unwrap_err`.
#[cfg(test)]
impl std::fmt::Debug for EncodeFrameResult {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("EncodeFrameResult")
      .field("data_len", &self.data.len())
      .field("is_keyframe", &self.is_keyframe)
      .field("size", &self.size)
      .finish()
  }
}

#[napi(object)]
pub struct DecodeFrameResult {
  pub width: u32,
  pub height: u32,
  /// Always `"rgb24"`
  pub layout: String,
  /// Tightly packed RGB24 pixels, `width * height * 3` bytes
  pub data: Buffer,
  pub first_pixel_r: u32,
  pub first_pixel_g: u32,
  pub first_pixel_b: u32,
}

/// Validated `EncodeFrameOptions`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EncodeParams {
  width: u32,
  height: u32,
  bit_rate: u64,
  layout: PixelLayout,
}

impl EncodeParams {
  fn parse(options: &EncodeFrameOptions) -> Result<Self> {
    let width = enforce_dimension(options.width, "width")?;
    let height = enforce_dimension(options.height, "height")?;
    let bit_rate = match options.bit_rate {
      Some(rate) => enforce_positive_u64(rate, "bitRate")?,
      None => DEFAULT_BIT_RATE,
    };
    let layout = match options.layout.as_deref() {
      Some(name) => PixelLayout::parse(name)?,
      None => PixelLayout::default(),
    };
    Ok(Self {
      width,
      height,
      bit_rate,
      layout,
    })
  }

  fn request<'a>(&self, pixels: &'a [u8]) -> EncodeRequest<'a> {
    EncodeRequest::new(pixels, self.width, self.height)
      .with_bit_rate(self.bit_rate)
      .with_layout(self.layout)
  }
}

fn encode(pixels: &[u8], params: EncodeParams) -> Result<EncodeFrameResult> {
  let encoded = codec::encode_frame(&params.request(pixels))?;
  let size = encoded.size() as u32;
  Ok(EncodeFrameResult {
    data: encoded.data.into(),
    is_keyframe: encoded.is_keyframe,
    size,
  })
}

fn decode(data: &[u8]) -> Result<DecodeFrameResult> {
  let decoded = codec::decode_frame(data)?;
  let [r, g, b] = decoded.first_pixel;
  Ok(DecodeFrameResult {
    width: decoded.width,
    height: decoded.height,
    layout: decoded.layout.as_str().to_string(),
    data: decoded.data.into(),
    first_pixel_r: r as u32,
    first_pixel_g: g as u32,
    first_pixel_b: b as u32,
  })
}

/// Encode one still image as a single VP8 key frame
#[napi]
pub fn encode_frame(pixels: Buffer, options: EncodeFrameOptions) -> Result<EncodeFrameResult> {
  let params = EncodeParams::parse(&options)?;
  encode(&pixels, params)
}

/// Decode one VP8 frame into RGB24 pixels
#[napi]
pub fn decode_frame(data: Buffer) -> Result<DecodeFrameResult> {
  decode(&data)
}

/// Same as `encodeFrame`, run on the blocking thread pool
#[napi]
pub async fn encode_frame_async(
  pixels: Buffer,
  options: EncodeFrameOptions,
) -> Result<EncodeFrameResult> {
  let params = EncodeParams::parse(&options)?;
  let pixels = pixels.to_vec();

  tokio::task::spawn_blocking(move || encode(&pixels, params))
    .await
    .map_err(|e| Error::new(Status::GenericFailure, format!("Task error: {}", e)))?
}

/// Same as `decodeFrame`, run on the blocking thread pool
#[napi]
pub async fn decode_frame_async(data: Buffer) -> Result<DecodeFrameResult> {
  let data = data.to_vec();

  tokio::task::spawn_blocking(move || decode(&data))
    .await
    .map_err(|e| Error::new(Status::GenericFailure, format!("Task error: {}", e)))?
}

#[cfg(test)]
mod tests {
  use super::*;

  fn options(width: f64, height: f64) -> EncodeFrameOptions {
    EncodeFrameOptions {
      width,
      height,
      bit_rate: None,
      layout: None,
    }
  }

  #[test]
  fn test_option_defaults() {
    let params = EncodeParams::parse(&options(16.0, 8.0)).unwrap();
    assert_eq!(
      params,
      EncodeParams {
        width: 16,
        height: 8,
        bit_rate: 500_000,
        layout: PixelLayout::Rgb24,
      }
    );
  }

  #[test]
  fn test_option_overrides() {
    let mut opts = options(16.0, 8.0);
    opts.bit_rate = Some(250_000.0);
    opts.layout = Some("I420".to_string());
    let params = EncodeParams::parse(&opts).unwrap();
    assert_eq!(params.bit_rate, 250_000);
    assert_eq!(params.layout, PixelLayout::I420);
  }

  #[test]
  fn test_invalid_options() {
    for opts in [options(0.0, 8.0), options(16.0, -2.0), options(16.5, 8.0)] {
      let err = EncodeParams::parse(&opts).unwrap_err();
      assert_eq!(err.status, Status::InvalidArg);
      assert!(err.reason.starts_with("InvalidArgumentError: "), "{}", err.reason);
    }

    let mut bad_layout = options(16.0, 8.0);
    bad_layout.layout = Some("NV12".to_string());
    let err = EncodeParams::parse(&bad_layout).unwrap_err();
    assert!(err.reason.starts_with("InvalidArgumentError: Unsupported pixel layout"));
  }

  #[test]
  fn test_encode_then_decode() {
    let pixels: Vec<u8> = [255u8, 0, 0].repeat(16 * 16);
    let params = EncodeParams::parse(&options(16.0, 16.0)).unwrap();

    let encoded = encode(&pixels, params).unwrap();
    assert!(encoded.is_keyframe);
    assert_eq!(encoded.size as usize, encoded.data.len());

    let decoded = decode(&encoded.data).unwrap();
    assert_eq!((decoded.width, decoded.height), (16, 16));
    assert_eq!(decoded.layout, "rgb24");
    assert!(decoded.first_pixel_r >= 200);
  }

  #[test]
  fn test_size_mismatch_reason() {
    let params = EncodeParams::parse(&options(10.0, 10.0)).unwrap();
    let err = encode(&[0u8; 299], params).unwrap_err();
    assert!(err.reason.starts_with("InvalidBufferSizeError: "), "{}", err.reason);
    assert!(err.reason.contains("300") && err.reason.contains("299"));
  }
}

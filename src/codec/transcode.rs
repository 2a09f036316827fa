//! One image in, one VP8 packet out (and back)
//!
//! Each call validates its input, opens a fresh session, runs it to
//! completion and copies the result out of native memory. The first failure
//! aborts the call; everything opened so far is released on the way out.

use super::layout::{PixelLayout, RawImage};
use super::scaler::{from_codec_format, to_codec_format};
use super::session::{DecoderSession, EncoderSession};
use super::{init, CodecError, CodecResult, EncoderConfig, Packet, DEFAULT_BIT_RATE};
use crate::ffi::{error::AVERROR_EOF, FFmpegError};

/// Parameters for `encode_frame`
#[derive(Debug, Clone, Copy)]
pub struct EncodeRequest<'a> {
  pub pixels: &'a [u8],
  pub width: u32,
  pub height: u32,
  /// Target bit rate in bits per second
  pub bit_rate: u64,
  pub layout: PixelLayout,
}

impl<'a> EncodeRequest<'a> {
  /// RGB24 request at the default bit rate
  pub fn new(pixels: &'a [u8], width: u32, height: u32) -> Self {
    Self {
      pixels,
      width,
      height,
      bit_rate: DEFAULT_BIT_RATE,
      layout: PixelLayout::default(),
    }
  }

  pub fn with_bit_rate(mut self, bit_rate: u64) -> Self {
    self.bit_rate = bit_rate;
    self
  }

  pub fn with_layout(mut self, layout: PixelLayout) -> Self {
    self.layout = layout;
    self
  }
}

/// A compressed VP8 frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
  pub data: Vec<u8>,
  /// Key flag reported by the encoder for this packet
  pub is_keyframe: bool,
}

impl EncodedFrame {
  pub fn size(&self) -> usize {
    self.data.len()
  }
}

/// A decoded frame as tightly packed pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
  pub width: u32,
  pub height: u32,
  pub layout: PixelLayout,
  pub data: Vec<u8>,
  /// Channels of the top-left pixel
  pub first_pixel: [u8; 3],
}

/// Encode a single still image as one VP8 key frame
pub fn encode_frame(request: &EncodeRequest<'_>) -> CodecResult<EncodedFrame> {
  if request.bit_rate == 0 {
    return Err(CodecError::InvalidArgument(
      "Bit rate must be a positive integer".to_string(),
    ));
  }
  let image = RawImage::new(request.pixels, request.width, request.height, request.layout)?;

  init::ensure_initialized();

  let session = EncoderSession::open(&EncoderConfig::vp8(
    image.width(),
    image.height(),
    request.bit_rate,
  ))?;
  let frame = to_codec_format(&image)?;
  let packet = session.encode_one(frame)?;

  Ok(EncodedFrame {
    data: packet.to_vec(),
    is_keyframe: packet.is_key(),
  })
}

/// Decode one VP8 frame into RGB24 pixels
pub fn decode_frame(data: &[u8]) -> CodecResult<DecodedFrame> {
  // A zero-length packet is the decoder's end-of-stream signal, so there is
  // never a frame to receive
  if data.is_empty() {
    return Err(CodecError::Drain {
      context: "Decoder produced no frame for empty input",
      source: FFmpegError::from_code(AVERROR_EOF),
    });
  }

  init::ensure_initialized();

  let session = DecoderSession::open()?;
  let packet = Packet::from_slice(data).map_err(|source| CodecError::Submit {
    context: "Failed to allocate packet",
    source,
  })?;
  let frame = session.decode_one(&packet)?;
  let image = from_codec_format(&frame, PixelLayout::Rgb24)?;

  let first_pixel = image.first_pixel().ok_or_else(|| {
    CodecError::ConversionContext("Decoded image has no pixels".to_string())
  })?;

  Ok(DecodedFrame {
    width: image.width,
    height: image.height,
    layout: image.layout,
    data: image.data,
    first_pixel,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::layout::chroma_dim;
  use crate::codec::{init_test_tracing, live, ErrorKind};

  fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    rgb.iter().copied().cycle().take(width as usize * height as usize * 3).collect()
  }

  fn solid_i420(width: u32, height: u32, yuv: [u8; 3]) -> Vec<u8> {
    let luma = width as usize * height as usize;
    let chroma = chroma_dim(width) * chroma_dim(height);
    let mut data = vec![yuv[0]; luma];
    data.resize(luma + chroma, yuv[1]);
    data.resize(luma + 2 * chroma, yuv[2]);
    data
  }

  #[test]
  fn test_red_round_trip() {
    init_test_tracing();

    let pixels = solid_rgb(16, 16, [255, 0, 0]);
    let encoded = encode_frame(&EncodeRequest::new(&pixels, 16, 16)).unwrap();
    assert!(encoded.size() > 0);
    assert!(encoded.is_keyframe);

    let decoded = decode_frame(&encoded.data).unwrap();
    assert_eq!((decoded.width, decoded.height), (16, 16));
    assert_eq!(decoded.layout, PixelLayout::Rgb24);
    assert_eq!(decoded.data.len(), 16 * 16 * 3);

    let [r, g, b] = decoded.first_pixel;
    assert!(r >= 200, "red channel too low: {}", r);
    assert!(g <= 50 && b <= 50, "green/blue too high: {} {}", g, b);
  }

  #[test]
  fn test_every_encode_is_a_keyframe() {
    init_test_tracing();

    for (w, h, rate) in [(16, 16, 500_000), (64, 32, 100_000), (2, 2, 1_000_000)] {
      let pixels = solid_rgb(w, h, [0, 128, 255]);
      let encoded =
        encode_frame(&EncodeRequest::new(&pixels, w, h).with_bit_rate(rate)).unwrap();
      assert!(encoded.is_keyframe, "{}x{} at {} was not a keyframe", w, h, rate);
    }
  }

  #[test]
  fn test_odd_dimensions_round_trip() {
    init_test_tracing();

    let pixels = solid_rgb(15, 9, [40, 160, 220]);
    let encoded = encode_frame(&EncodeRequest::new(&pixels, 15, 9)).unwrap();
    let decoded = decode_frame(&encoded.data).unwrap();
    assert_eq!((decoded.width, decoded.height), (15, 9));
    assert_eq!(decoded.data.len(), 15 * 9 * 3);
  }

  #[test]
  fn test_i420_matches_rgb24_path() {
    init_test_tracing();

    // BT.601 limited-range red
    let i420 = solid_i420(16, 16, [81, 90, 240]);
    let rgb = solid_rgb(16, 16, [255, 0, 0]);

    let from_i420 = encode_frame(&EncodeRequest::new(&i420, 16, 16).with_layout(PixelLayout::I420))
      .and_then(|e| decode_frame(&e.data))
      .unwrap();
    let from_rgb = encode_frame(&EncodeRequest::new(&rgb, 16, 16))
      .and_then(|e| decode_frame(&e.data))
      .unwrap();

    for (a, b) in from_i420.first_pixel.iter().zip(from_rgb.first_pixel.iter()) {
      assert!(a.abs_diff(*b) <= 24, "{:?} vs {:?}", from_i420.first_pixel, from_rgb.first_pixel);
    }
  }

  #[test]
  fn test_invalid_sizes_touch_no_native_resources() {
    let before = live::snapshot();

    let short = vec![0u8; 299];
    let err = encode_frame(&EncodeRequest::new(&short, 10, 10)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidBufferSize);

    let long = vec![0u8; 151];
    let err = encode_frame(&EncodeRequest::new(&long, 10, 10).with_layout(PixelLayout::I420))
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidBufferSize);

    let err = encode_frame(&EncodeRequest::new(&[], 0, 10)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let pixels = solid_rgb(4, 4, [0, 0, 0]);
    let err = encode_frame(&EncodeRequest::new(&pixels, 4, 4).with_bit_rate(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    assert_eq!(live::snapshot(), before);
  }

  #[test]
  fn test_empty_decode_input_is_a_drain_error() {
    let before = live::snapshot();
    for _ in 0..16 {
      let err = decode_frame(&[]).unwrap_err();
      assert_eq!(err.kind(), ErrorKind::Drain);
      assert!(err.to_string().starts_with("Decoder produced no frame"), "{}", err);
    }
    assert_eq!(live::snapshot(), before);
  }

  #[test]
  fn test_malformed_packets_release_everything() {
    init_test_tracing();

    let before = live::snapshot();
    let inputs: [&[u8]; 3] = [&[0x00; 32], &[0xff; 7], &[0x10, 0x02, 0x00, 0x9d, 0x01]];
    for _ in 0..16 {
      for input in inputs {
        let err = decode_frame(input).unwrap_err();
        assert!(
          matches!(err.kind(), ErrorKind::Submit | ErrorKind::Drain),
          "unexpected error: {}",
          err
        );
      }
    }
    assert_eq!(live::snapshot(), before);
  }

  #[test]
  fn test_unencodable_size_releases_everything() {
    init_test_tracing();

    // Wider than VP8's 14-bit frame size field
    let pixels = solid_rgb(20_000, 1, [1, 2, 3]);
    let before = live::snapshot();
    for _ in 0..4 {
      assert!(encode_frame(&EncodeRequest::new(&pixels, 20_000, 1)).is_err());
    }
    assert_eq!(live::snapshot(), before);
  }

  #[test]
  fn test_successful_calls_release_everything() {
    init_test_tracing();

    let pixels = solid_rgb(8, 8, [9, 9, 9]);
    let before = live::snapshot();
    for _ in 0..8 {
      let encoded = encode_frame(&EncodeRequest::new(&pixels, 8, 8)).unwrap();
      decode_frame(&encoded.data).unwrap();
    }
    assert_eq!(live::snapshot(), before);
  }
}

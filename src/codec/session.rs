//! Single-use VP8 codec sessions
//!
//! A session owns one opened AVCodecContext bound to one direction. Sessions
//! are consumed by `encode_one` / `decode_one`, so a context is never fed a
//! second frame or packet, and `Drop` releases it on every exit path.

use crate::ffi::{
  self,
  accessors::{
    ffcodec_get_name, ffctx_get_height, ffctx_get_pix_fmt, ffctx_get_width, ffctx_set_bit_rate,
    ffctx_set_framerate, ffctx_set_gop_size, ffctx_set_height, ffctx_set_max_b_frames,
    ffctx_set_pix_fmt, ffctx_set_time_base, ffctx_set_width,
  },
  avcodec::{
    avcodec_alloc_context3, avcodec_free_context, avcodec_open2, avcodec_receive_frame,
    avcodec_receive_packet, avcodec_send_frame, avcodec_send_packet, find_decoder, find_encoder,
    find_encoder_by_name,
  },
  AVCodec, AVCodecContext, AVCodecID, AVPixelFormat, FFmpegError,
};
use std::ffi::CStr;
use std::fmt;
use std::os::raw::c_int;
use std::ptr::NonNull;

use super::live::{self, Resource};
use super::{
  CodecError, CodecResult, CodecType, EncoderConfig, Frame, Packet, PREFERRED_VP8_ENCODER,
};

/// Lifecycle of a codec session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
  Unallocated,
  Allocated,
  Opened,
  Consumed,
  Closed,
}

impl fmt::Display for SessionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      SessionState::Unallocated => "unallocated",
      SessionState::Allocated => "allocated",
      SessionState::Opened => "opened",
      SessionState::Consumed => "consumed",
      SessionState::Closed => "closed",
    };
    f.write_str(name)
  }
}

// ============================================================================
// Codec Context
// ============================================================================

struct CodecContext {
  ptr: NonNull<AVCodecContext>,
  codec: *const AVCodec,
  codec_type: CodecType,
  state: SessionState,
}

impl CodecContext {
  fn alloc(codec: *const AVCodec, codec_type: CodecType) -> CodecResult<Self> {
    let ptr = unsafe { avcodec_alloc_context3(codec) };
    let ptr = NonNull::new(ptr).ok_or_else(|| CodecError::CodecOpen {
      context: "Failed to allocate codec context",
      source: FFmpegError::out_of_memory("AVCodecContext"),
    })?;
    live::acquired(Resource::CodecContext);

    let mut ctx = Self {
      ptr,
      codec,
      codec_type,
      state: SessionState::Unallocated,
    };
    ctx.advance(SessionState::Allocated);
    Ok(ctx)
  }

  fn open(&mut self) -> CodecResult<()> {
    let ret = unsafe { avcodec_open2(self.ptr.as_ptr(), self.codec, std::ptr::null_mut()) };
    ffi::check_error(ret).map_err(|source| CodecError::CodecOpen {
      context: match self.codec_type {
        CodecType::Encoder => "Failed to open encoder",
        CodecType::Decoder => "Failed to open decoder",
      },
      source,
    })?;
    self.advance(SessionState::Opened);
    Ok(())
  }

  fn advance(&mut self, next: SessionState) {
    tracing::trace!(
      target: "vp8_frame",
      codec_type = %self.codec_type,
      from = %self.state,
      to = %next,
      "session state transition"
    );
    self.state = next;
  }

  fn codec_name(&self) -> &str {
    let name = unsafe { ffcodec_get_name(self.codec) };
    if name.is_null() {
      return "unknown";
    }
    unsafe { CStr::from_ptr(name) }.to_str().unwrap_or("unknown")
  }

  #[inline]
  fn as_mut_ptr(&mut self) -> *mut AVCodecContext {
    self.ptr.as_ptr()
  }

  fn width(&self) -> u32 {
    unsafe { ffctx_get_width(self.ptr.as_ptr()).max(0) as u32 }
  }

  fn height(&self) -> u32 {
    unsafe { ffctx_get_height(self.ptr.as_ptr()).max(0) as u32 }
  }

  fn pixel_format(&self) -> AVPixelFormat {
    AVPixelFormat::from_raw(unsafe { ffctx_get_pix_fmt(self.ptr.as_ptr()) })
  }
}

impl Drop for CodecContext {
  fn drop(&mut self) {
    self.advance(SessionState::Closed);
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      avcodec_free_context(&mut ptr);
    }
    live::released(Resource::CodecContext);
  }
}

impl fmt::Debug for CodecContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CodecContext")
      .field("codec", &self.codec_name())
      .field("codec_type", &self.codec_type)
      .field("state", &self.state)
      .field("width", &self.width())
      .field("height", &self.height())
      .finish()
  }
}

// ============================================================================
// Encoder
// ============================================================================

/// An opened VP8 encoder that accepts exactly one frame
#[derive(Debug)]
pub struct EncoderSession {
  ctx: CodecContext,
}

impl EncoderSession {
  /// Open a VP8 encoder, preferring libvpx and falling back to any
  /// registered VP8 encoder.
  pub fn open(config: &EncoderConfig) -> CodecResult<Self> {
    let mut codec = find_encoder_by_name(PREFERRED_VP8_ENCODER);
    if codec.is_null() {
      codec = find_encoder(AVCodecID::Vp8);
      if !codec.is_null() {
        tracing::warn!(
          target: "vp8_frame",
          "{} is not available, falling back to the default VP8 encoder",
          PREFERRED_VP8_ENCODER
        );
      }
    }
    if codec.is_null() {
      return Err(CodecError::CodecUnavailable {
        codec_type: CodecType::Encoder,
        codec: AVCodecID::Vp8.label(),
      });
    }

    let (width, height) = match (c_int::try_from(config.width), c_int::try_from(config.height)) {
      (Ok(w), Ok(h)) => (w, h),
      _ => {
        return Err(CodecError::InvalidArgument(format!(
          "Frame size {}x{} is out of range",
          config.width, config.height
        )))
      }
    };

    let mut ctx = CodecContext::alloc(codec, CodecType::Encoder)?;

    unsafe {
      let raw = ctx.as_mut_ptr();

      ffctx_set_width(raw, width);
      ffctx_set_height(raw, height);
      ffctx_set_pix_fmt(raw, config.pixel_format.as_raw());
      ffctx_set_bit_rate(raw, i64::try_from(config.bitrate).unwrap_or(i64::MAX));

      // Time base is the inverse of the frame rate
      ffctx_set_time_base(raw, config.framerate_den, config.framerate_num);
      ffctx_set_framerate(raw, config.framerate_num, config.framerate_den);

      ffctx_set_gop_size(raw, config.gop_size);
      ffctx_set_max_b_frames(raw, config.max_b_frames);
    }

    ctx.open()?;

    tracing::debug!(
      target: "vp8_frame",
      codec = ctx.codec_name(),
      width = config.width,
      height = config.height,
      bitrate = config.bitrate,
      "opened encoder"
    );

    Ok(Self { ctx })
  }

  pub fn state(&self) -> SessionState {
    self.ctx.state
  }

  pub fn codec_name(&self) -> &str {
    self.ctx.codec_name()
  }

  pub fn width(&self) -> u32 {
    self.ctx.width()
  }

  pub fn height(&self) -> u32 {
    self.ctx.height()
  }

  pub fn pixel_format(&self) -> AVPixelFormat {
    self.ctx.pixel_format()
  }

  /// Encode `frame` as a key frame and return its single packet.
  ///
  /// The frame is submitted with pts 0, then the encoder is drained with an
  /// end-of-stream signal so the packet is emitted immediately.
  pub fn encode_one(mut self, mut frame: Frame) -> CodecResult<Packet> {
    frame.set_pts(0);
    frame.mark_key_frame();

    let ret = unsafe { avcodec_send_frame(self.ctx.as_mut_ptr(), frame.as_ptr()) };
    ffi::check_error(ret).map_err(|source| CodecError::Submit {
      context: "Failed to send frame to encoder",
      source,
    })?;

    let ret = unsafe { avcodec_send_frame(self.ctx.as_mut_ptr(), std::ptr::null()) };
    ffi::check_error(ret).map_err(|source| CodecError::Submit {
      context: "Failed to flush encoder",
      source,
    })?;
    self.ctx.advance(SessionState::Consumed);

    let mut packet = Packet::new().map_err(|source| CodecError::Drain {
      context: "Failed to allocate packet",
      source,
    })?;
    let ret = unsafe { avcodec_receive_packet(self.ctx.as_mut_ptr(), packet.as_mut_ptr()) };
    ffi::check_error(ret).map_err(|source| CodecError::Drain {
      context: if source.would_block() {
        "Encoder produced no packet"
      } else {
        "Failed to receive packet from encoder"
      },
      source,
    })?;

    tracing::debug!(
      target: "vp8_frame",
      size = packet.size(),
      key = packet.is_key(),
      "encoded frame"
    );

    Ok(packet)
  }
}

// ============================================================================
// Decoder
// ============================================================================

/// An opened VP8 decoder that accepts exactly one packet
#[derive(Debug)]
pub struct DecoderSession {
  ctx: CodecContext,
}

impl DecoderSession {
  /// Open the registered VP8 decoder with default settings
  pub fn open() -> CodecResult<Self> {
    Self::open_id(AVCodecID::Vp8)
  }

  fn open_id(id: AVCodecID) -> CodecResult<Self> {
    let codec = find_decoder(id);
    if codec.is_null() {
      return Err(CodecError::CodecUnavailable {
        codec_type: CodecType::Decoder,
        codec: id.label(),
      });
    }

    let mut ctx = CodecContext::alloc(codec, CodecType::Decoder)?;
    ctx.open()?;

    tracing::debug!(target: "vp8_frame", codec = ctx.codec_name(), "opened decoder");

    Ok(Self { ctx })
  }

  pub fn state(&self) -> SessionState {
    self.ctx.state
  }

  pub fn codec_name(&self) -> &str {
    self.ctx.codec_name()
  }

  /// Decode `packet` and return its single frame.
  ///
  /// The end-of-stream signal after the packet makes frame-threaded
  /// decoders release the frame instead of waiting for more input.
  pub fn decode_one(mut self, packet: &Packet) -> CodecResult<Frame> {
    let ret = unsafe { avcodec_send_packet(self.ctx.as_mut_ptr(), packet.as_ptr()) };
    ffi::check_error(ret).map_err(|source| CodecError::Submit {
      context: "Failed to send packet to decoder",
      source,
    })?;

    let ret = unsafe { avcodec_send_packet(self.ctx.as_mut_ptr(), std::ptr::null()) };
    ffi::check_error(ret).map_err(|source| CodecError::Submit {
      context: "Failed to flush decoder",
      source,
    })?;
    self.ctx.advance(SessionState::Consumed);

    let mut frame = Frame::new().map_err(|source| CodecError::Drain {
      context: "Failed to allocate frame",
      source,
    })?;
    let ret = unsafe { avcodec_receive_frame(self.ctx.as_mut_ptr(), frame.as_mut_ptr()) };
    ffi::check_error(ret).map_err(|source| CodecError::Drain {
      context: if source.would_block() {
        "Decoder produced no frame"
      } else {
        "Failed to receive frame from decoder"
      },
      source,
    })?;

    tracing::debug!(
      target: "vp8_frame",
      width = frame.width(),
      height = frame.height(),
      format = frame.format_raw(),
      "decoded frame"
    );

    Ok(frame)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::{init, init_test_tracing, ErrorKind};

  fn gray_frame(width: u32, height: u32) -> Frame {
    let mut frame = Frame::new_video(width, height, AVPixelFormat::Yuv420p).unwrap();
    for plane in 0..3 {
      frame.plane_data_mut(plane).unwrap().fill(128);
    }
    frame
  }

  #[test]
  fn test_open_encoder() {
    init_test_tracing();
    init::ensure_initialized();

    let session = EncoderSession::open(&EncoderConfig::vp8(32, 16, 300_000)).unwrap();
    assert_eq!(session.state(), SessionState::Opened);
    assert_eq!(session.width(), 32);
    assert_eq!(session.height(), 16);
    assert_eq!(session.pixel_format(), AVPixelFormat::Yuv420p);
  }

  #[test]
  fn test_encode_one_emits_a_key_packet() {
    init_test_tracing();
    init::ensure_initialized();

    let session = EncoderSession::open(&EncoderConfig::vp8(16, 16, 500_000)).unwrap();
    let packet = session.encode_one(gray_frame(16, 16)).unwrap();
    assert!(packet.size() > 0);
    assert!(packet.is_key());
  }

  #[test]
  fn test_decode_one_restores_dimensions() {
    init_test_tracing();
    init::ensure_initialized();

    let packet = EncoderSession::open(&EncoderConfig::vp8(24, 8, 500_000))
      .unwrap()
      .encode_one(gray_frame(24, 8))
      .unwrap();

    let decoder = DecoderSession::open().unwrap();
    assert_eq!(decoder.state(), SessionState::Opened);
    let frame = decoder.decode_one(&packet).unwrap();
    assert_eq!((frame.width(), frame.height()), (24, 8));
  }

  #[test]
  fn test_garbage_packet_fails_to_decode() {
    init_test_tracing();
    init::ensure_initialized();

    let packet = Packet::from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x11, 0x22, 0x33]).unwrap();
    let err = DecoderSession::open().unwrap().decode_one(&packet).unwrap_err();
    assert!(
      matches!(err.kind(), ErrorKind::Submit | ErrorKind::Drain),
      "unexpected error: {}",
      err
    );
  }

  #[test]
  fn test_failed_decodes_release_sessions() {
    init_test_tracing();
    init::ensure_initialized();

    let before = live::snapshot();
    for _ in 0..8 {
      let packet = Packet::from_slice(&[0x00; 16]).unwrap();
      assert!(DecoderSession::open().unwrap().decode_one(&packet).is_err());
    }
    assert_eq!(live::snapshot(), before);
  }

  #[test]
  fn test_unknown_decoder_allocates_nothing() {
    init_test_tracing();
    init::ensure_initialized();

    let before = live::snapshot();
    for _ in 0..16 {
      let err = DecoderSession::open_id(AVCodecID::None).unwrap_err();
      assert_eq!(err.kind(), ErrorKind::CodecUnavailable);
      assert_eq!(err.to_string(), "No decoder found for none");
    }
    assert_eq!(live::snapshot(), before);
  }

  #[test]
  fn test_out_of_range_encoder_size_allocates_nothing() {
    init_test_tracing();
    init::ensure_initialized();

    let before = live::snapshot();
    for _ in 0..16 {
      let config = EncoderConfig::vp8(i32::MAX as u32 + 1, 16, 500_000);
      let err = EncoderSession::open(&config).unwrap_err();
      assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
    assert_eq!(live::snapshot(), before);
  }

  #[test]
  fn test_session_state_order() {
    assert!(SessionState::Unallocated < SessionState::Allocated);
    assert!(SessionState::Opened < SessionState::Consumed);
    assert_eq!(SessionState::Closed.to_string(), "closed");
  }
}

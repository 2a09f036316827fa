//! libavcodec function declarations
//!
//! Provides codec discovery, context lifecycle, and the send/receive API.

use super::types::*;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_uint, c_void};

unsafe extern "C" {
  // ========================================================================
  // Codec Discovery
  // ========================================================================

  /// Find an encoder by codec ID
  pub fn avcodec_find_encoder(id: c_int) -> *const AVCodec;

  /// Find an encoder by name (e.g., "libvpx")
  pub fn avcodec_find_encoder_by_name(name: *const c_char) -> *const AVCodec;

  /// Find a decoder by codec ID
  pub fn avcodec_find_decoder(id: c_int) -> *const AVCodec;

  /// Find a decoder by name
  pub fn avcodec_find_decoder_by_name(name: *const c_char) -> *const AVCodec;

  /// Iterate over all registered codecs
  ///
  /// `opaque` must point to a NULL-initialised pointer on the first call.
  /// Returns NULL when the iteration is finished.
  pub fn av_codec_iterate(opaque: *mut *mut c_void) -> *const AVCodec;

  /// Non-zero if the codec is an encoder
  pub fn av_codec_is_encoder(codec: *const AVCodec) -> c_int;

  /// Non-zero if the codec is a decoder
  pub fn av_codec_is_decoder(codec: *const AVCodec) -> c_int;

  /// Packed LIBAVCODEC_VERSION_INT of the linked library
  pub fn avcodec_version() -> c_uint;

  // ========================================================================
  // Codec Context Lifecycle
  // ========================================================================

  /// Allocate an AVCodecContext and set its fields to default values
  pub fn avcodec_alloc_context3(codec: *const AVCodec) -> *mut AVCodecContext;

  /// Free the codec context and everything associated with it
  pub fn avcodec_free_context(avctx: *mut *mut AVCodecContext);

  /// Initialize the AVCodecContext to use the given AVCodec
  pub fn avcodec_open2(
    avctx: *mut AVCodecContext,
    codec: *const AVCodec,
    options: *mut *mut AVDictionary,
  ) -> c_int;

  // ========================================================================
  // Encoding (send frame, receive packet)
  // ========================================================================

  /// Supply a raw video frame to the encoder, or NULL to enter draining mode
  ///
  /// # Returns
  /// * 0 on success
  /// * AVERROR(EAGAIN) - output must be read with receive_packet first
  /// * AVERROR_EOF - encoder has been flushed
  /// * AVERROR(EINVAL) - codec not opened, or frame rejected
  pub fn avcodec_send_frame(avctx: *mut AVCodecContext, frame: *const AVFrame) -> c_int;

  /// Read encoded data from the encoder
  ///
  /// # Returns
  /// * 0 on success
  /// * AVERROR(EAGAIN) - output not available, must send more input
  /// * AVERROR_EOF - encoder has been fully flushed
  pub fn avcodec_receive_packet(avctx: *mut AVCodecContext, avpkt: *mut AVPacket) -> c_int;

  // ========================================================================
  // Decoding (send packet, receive frame)
  // ========================================================================

  /// Supply compressed data to the decoder, or NULL to enter draining mode
  ///
  /// # Returns
  /// * 0 on success
  /// * AVERROR(EAGAIN) - output must be read with receive_frame first
  /// * AVERROR_EOF - decoder has been flushed
  /// * AVERROR_INVALIDDATA - malformed bitstream
  pub fn avcodec_send_packet(avctx: *mut AVCodecContext, avpkt: *const AVPacket) -> c_int;

  /// Return decoded output data from the decoder
  ///
  /// # Returns
  /// * 0 on success
  /// * AVERROR(EAGAIN) - output not available, must send more input
  /// * AVERROR_EOF - decoder has been fully flushed
  pub fn avcodec_receive_frame(avctx: *mut AVCodecContext, frame: *mut AVFrame) -> c_int;

  // ========================================================================
  // Packet Management
  // ========================================================================

  /// Allocate an AVPacket and set its fields to default values
  pub fn av_packet_alloc() -> *mut AVPacket;

  /// Free the packet, unreferencing its buffer first
  pub fn av_packet_free(pkt: *mut *mut AVPacket);

  /// Allocate a refcounted payload of `size` bytes (plus zeroed input padding)
  pub fn av_new_packet(pkt: *mut AVPacket, size: c_int) -> c_int;
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Find encoder by AVCodecID enum
pub fn find_encoder(codec_id: AVCodecID) -> *const AVCodec {
  unsafe { avcodec_find_encoder(codec_id.as_raw()) }
}

/// Find decoder by AVCodecID enum
pub fn find_decoder(codec_id: AVCodecID) -> *const AVCodec {
  unsafe { avcodec_find_decoder(codec_id.as_raw()) }
}

/// Find encoder by name. Names containing NUL never match.
pub fn find_encoder_by_name(name: &str) -> *const AVCodec {
  match CString::new(name) {
    Ok(c_name) => unsafe { avcodec_find_encoder_by_name(c_name.as_ptr()) },
    Err(_) => std::ptr::null(),
  }
}

/// Find decoder by name. Names containing NUL never match.
pub fn find_decoder_by_name(name: &str) -> *const AVCodec {
  match CString::new(name) {
    Ok(c_name) => unsafe { avcodec_find_decoder_by_name(c_name.as_ptr()) },
    Err(_) => std::ptr::null(),
  }
}

//! Rust declarations for C accessor functions
//!
//! These functions provide access to FFmpeg struct fields via the thin C accessor library.

use super::types::*;
use std::os::raw::{c_char, c_int};

unsafe extern "C" {
  // ========================================================================
  // AVCodecContext Setters
  // ========================================================================

  pub fn ffctx_set_width(ctx: *mut AVCodecContext, width: c_int);
  pub fn ffctx_set_height(ctx: *mut AVCodecContext, height: c_int);
  pub fn ffctx_set_pix_fmt(ctx: *mut AVCodecContext, pix_fmt: c_int);
  pub fn ffctx_set_bit_rate(ctx: *mut AVCodecContext, bit_rate: i64);
  pub fn ffctx_set_gop_size(ctx: *mut AVCodecContext, gop_size: c_int);
  pub fn ffctx_set_max_b_frames(ctx: *mut AVCodecContext, max_b_frames: c_int);
  pub fn ffctx_set_time_base(ctx: *mut AVCodecContext, num: c_int, den: c_int);
  pub fn ffctx_set_framerate(ctx: *mut AVCodecContext, num: c_int, den: c_int);

  // ========================================================================
  // AVCodecContext Getters
  // ========================================================================

  pub fn ffctx_get_width(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_height(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_get_pix_fmt(ctx: *const AVCodecContext) -> c_int;

  // ========================================================================
  // AVFrame Setters
  // ========================================================================

  pub fn ffframe_set_width(frame: *mut AVFrame, width: c_int);
  pub fn ffframe_set_height(frame: *mut AVFrame, height: c_int);
  pub fn ffframe_set_format(frame: *mut AVFrame, format: c_int);
  pub fn ffframe_set_pts(frame: *mut AVFrame, pts: i64);
  /// Sets or clears the key flag (`AV_FRAME_FLAG_KEY` or the legacy `key_frame` field)
  pub fn ffframe_set_key_frame(frame: *mut AVFrame, key_frame: c_int);
  pub fn ffframe_set_pict_type(frame: *mut AVFrame, pict_type: c_int);

  // ========================================================================
  // AVFrame Getters
  // ========================================================================

  pub fn ffframe_get_width(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_height(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_format(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_pts(frame: *const AVFrame) -> i64;
  pub fn ffframe_get_key_frame(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_pict_type(frame: *const AVFrame) -> c_int;

  // ========================================================================
  // AVFrame Data Access
  // ========================================================================

  pub fn ffframe_data(frame: *mut AVFrame, plane: c_int) -> *mut u8;
  pub fn ffframe_data_const(frame: *const AVFrame, plane: c_int) -> *const u8;
  pub fn ffframe_linesize(frame: *const AVFrame, plane: c_int) -> c_int;

  // ========================================================================
  // AVPacket Access
  // ========================================================================

  pub fn ffpkt_data(pkt: *const AVPacket) -> *const u8;
  pub fn ffpkt_data_mut(pkt: *mut AVPacket) -> *mut u8;
  pub fn ffpkt_size(pkt: *const AVPacket) -> c_int;
  pub fn ffpkt_flags(pkt: *const AVPacket) -> c_int;
  pub fn ffpkt_pts(pkt: *const AVPacket) -> i64;

  // ========================================================================
  // AVCodec Descriptor Access
  // ========================================================================

  pub fn ffcodec_get_name(codec: *const AVCodec) -> *const c_char;
  /// May return NULL when the codec has no long name
  pub fn ffcodec_get_long_name(codec: *const AVCodec) -> *const c_char;
  pub fn ffcodec_get_type(codec: *const AVCodec) -> c_int;
}

//! Safe wrapper around FFmpeg AVPacket
//!
//! Provides RAII-based memory management for compressed VP8 data.

use crate::ffi::{
  self,
  accessors::{ffpkt_data, ffpkt_data_mut, ffpkt_flags, ffpkt_pts, ffpkt_size},
  avcodec::{av_new_packet, av_packet_alloc, av_packet_free},
  pkt_flag, AVPacket, FFmpegError, FFmpegResult,
};
use std::os::raw::c_int;
use std::ptr::NonNull;

use super::live::{self, Resource};

/// Safe wrapper around AVPacket with RAII cleanup
pub struct Packet {
  ptr: NonNull<AVPacket>,
}

impl Packet {
  /// Allocate a new empty packet
  pub fn new() -> FFmpegResult<Self> {
    let ptr = unsafe { av_packet_alloc() };
    let ptr = NonNull::new(ptr).ok_or_else(|| FFmpegError::out_of_memory("AVPacket"))?;
    live::acquired(Resource::Packet);
    Ok(Self { ptr })
  }

  /// Allocate a packet owning a copy of `data`.
  ///
  /// The payload is refcounted and carries FFmpeg's zeroed input padding,
  /// which decoders read past the end of the bitstream.
  pub fn from_slice(data: &[u8]) -> FFmpegResult<Self> {
    let size = c_int::try_from(data.len()).map_err(|_| {
      FFmpegError::new(
        ffi::error::AVERROR_EINVAL,
        format!("packet of {} bytes is too large", data.len()),
      )
    })?;

    let mut packet = Self::new()?;
    ffi::check_error(unsafe { av_new_packet(packet.as_mut_ptr(), size) })?;

    if !data.is_empty() {
      unsafe {
        let dst = ffpkt_data_mut(packet.as_mut_ptr());
        std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
      }
    }

    Ok(packet)
  }

  /// Get the raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_ptr(&self) -> *const AVPacket {
    self.ptr.as_ptr()
  }

  /// Get the mutable raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVPacket {
    self.ptr.as_ptr()
  }

  // ========================================================================
  // Data Access
  // ========================================================================

  /// Get packet data as a slice
  pub fn as_slice(&self) -> &[u8] {
    let ptr = unsafe { ffpkt_data(self.as_ptr()) };
    let size = self.size();
    if ptr.is_null() || size <= 0 {
      &[]
    } else {
      unsafe { std::slice::from_raw_parts(ptr, size as usize) }
    }
  }

  /// Get packet size in bytes
  #[inline]
  pub fn size(&self) -> i32 {
    unsafe { ffpkt_size(self.as_ptr()) }
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.size() <= 0
  }

  #[inline]
  pub fn pts(&self) -> i64 {
    unsafe { ffpkt_pts(self.as_ptr()) }
  }

  /// Get packet flags
  #[inline]
  pub fn flags(&self) -> i32 {
    unsafe { ffpkt_flags(self.as_ptr()) }
  }

  /// Check if this is a key frame packet
  #[inline]
  pub fn is_key(&self) -> bool {
    (self.flags() & pkt_flag::KEY) != 0
  }

  /// Copy packet data to a new Vec
  pub fn to_vec(&self) -> Vec<u8> {
    self.as_slice().to_vec()
  }
}

impl Drop for Packet {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_packet_free(&mut ptr);
    }
    live::released(Resource::Packet);
  }
}

// Packet data can be sent between threads
unsafe impl Send for Packet {}

impl std::fmt::Debug for Packet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Packet")
      .field("size", &self.size())
      .field("pts", &self.pts())
      .field("is_key", &self.is_key())
      .finish()
  }
}

//! Safe wrapper around FFmpeg AVFrame
//!
//! Provides RAII-based memory management and stride-aware plane access.

use crate::ffi::{
  self,
  accessors::{
    ffframe_data, ffframe_data_const, ffframe_get_format, ffframe_get_height,
    ffframe_get_key_frame, ffframe_get_pict_type, ffframe_get_pts, ffframe_get_width,
    ffframe_linesize, ffframe_set_format, ffframe_set_height, ffframe_set_key_frame,
    ffframe_set_pict_type, ffframe_set_pts, ffframe_set_width,
  },
  avutil::{av_frame_alloc, av_frame_free, av_frame_get_buffer, av_frame_make_writable},
  AVFrame, AVPictureType, AVPixelFormat, FFmpegError, FFmpegResult,
};
use std::os::raw::c_int;
use std::ptr::NonNull;

use super::live::{self, Resource};

/// Safe wrapper around AVFrame with RAII cleanup
pub struct Frame {
  ptr: NonNull<AVFrame>,
}

impl Frame {
  /// Allocate a new empty frame
  pub fn new() -> FFmpegResult<Self> {
    let ptr = unsafe { av_frame_alloc() };
    let ptr = NonNull::new(ptr).ok_or_else(|| FFmpegError::out_of_memory("AVFrame"))?;
    live::acquired(Resource::Frame);
    Ok(Self { ptr })
  }

  /// Allocate a writable frame with buffers for the given format and dimensions.
  ///
  /// Rows are 32-byte aligned, so `linesize` may exceed the visible width.
  pub fn new_video(width: u32, height: u32, format: AVPixelFormat) -> FFmpegResult<Self> {
    let (w, h) = match (c_int::try_from(width), c_int::try_from(height)) {
      (Ok(w), Ok(h)) => (w, h),
      _ => {
        return Err(FFmpegError::new(
          ffi::error::AVERROR_EINVAL,
          format!("frame size {}x{} is out of range", width, height),
        ))
      }
    };

    let mut frame = Self::new()?;

    unsafe {
      ffframe_set_width(frame.as_mut_ptr(), w);
      ffframe_set_height(frame.as_mut_ptr(), h);
      ffframe_set_format(frame.as_mut_ptr(), format.as_raw());
    }

    ffi::check_error(unsafe { av_frame_get_buffer(frame.as_mut_ptr(), 32) })?;
    ffi::check_error(unsafe { av_frame_make_writable(frame.as_mut_ptr()) })?;

    Ok(frame)
  }

  /// Get the raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_ptr(&self) -> *const AVFrame {
    self.ptr.as_ptr()
  }

  /// Get the mutable raw pointer (for FFmpeg API calls)
  #[inline]
  pub fn as_mut_ptr(&mut self) -> *mut AVFrame {
    self.ptr.as_ptr()
  }

  // ========================================================================
  // Dimensions and Format
  // ========================================================================

  #[inline]
  pub fn width(&self) -> u32 {
    unsafe { ffframe_get_width(self.as_ptr()).max(0) as u32 }
  }

  #[inline]
  pub fn height(&self) -> u32 {
    unsafe { ffframe_get_height(self.as_ptr()).max(0) as u32 }
  }

  /// Pixel format; formats outside this crate's subset map to `None`
  pub fn format(&self) -> AVPixelFormat {
    AVPixelFormat::from_raw(self.format_raw())
  }

  /// Raw `AVFrame::format` value, as swscale expects it
  #[inline]
  pub fn format_raw(&self) -> c_int {
    unsafe { ffframe_get_format(self.as_ptr()) }
  }

  // ========================================================================
  // Timestamps and Frame Type
  // ========================================================================

  #[inline]
  pub fn pts(&self) -> i64 {
    unsafe { ffframe_get_pts(self.as_ptr()) }
  }

  #[inline]
  pub fn set_pts(&mut self, pts: i64) {
    unsafe { ffframe_set_pts(self.as_mut_ptr(), pts) }
  }

  /// Tag the frame as an intra-coded key frame
  pub fn mark_key_frame(&mut self) {
    unsafe {
      ffframe_set_key_frame(self.as_mut_ptr(), 1);
      ffframe_set_pict_type(self.as_mut_ptr(), AVPictureType::I as c_int);
    }
  }

  #[inline]
  pub fn is_key_frame(&self) -> bool {
    unsafe { ffframe_get_key_frame(self.as_ptr()) != 0 }
  }

  pub fn pict_type(&self) -> AVPictureType {
    match unsafe { ffframe_get_pict_type(self.as_ptr()) } {
      1 => AVPictureType::I,
      2 => AVPictureType::P,
      3 => AVPictureType::B,
      _ => AVPictureType::None,
    }
  }

  // ========================================================================
  // Data Access
  // ========================================================================

  /// Pointer to plane data, valid while the frame is alive
  pub fn data(&self, plane: usize) -> *const u8 {
    unsafe { ffframe_data_const(self.as_ptr(), plane as c_int) }
  }

  /// Mutable pointer to plane data, valid while the frame is alive
  pub fn data_mut(&mut self, plane: usize) -> *mut u8 {
    unsafe { ffframe_data(self.as_mut_ptr(), plane as c_int) }
  }

  /// Line size (stride) for a plane
  #[inline]
  pub fn linesize(&self, plane: usize) -> i32 {
    unsafe { ffframe_linesize(self.as_ptr(), plane as c_int) }
  }

  /// Number of rows in a plane of a YUV 4:2:0 frame
  fn plane_rows(&self, plane: usize) -> Option<usize> {
    match (plane, self.format()) {
      (0, _) => Some(self.height() as usize),
      (1 | 2, AVPixelFormat::Yuv420p) => Some((self.height() as usize).div_ceil(2)),
      _ => None,
    }
  }

  /// Plane data including row padding (`linesize * rows` bytes)
  pub fn plane_data(&self, plane: usize) -> Option<&[u8]> {
    let ptr = self.data(plane);
    let linesize = self.linesize(plane);
    if ptr.is_null() || linesize <= 0 {
      return None;
    }
    let rows = self.plane_rows(plane)?;
    Some(unsafe { std::slice::from_raw_parts(ptr, linesize as usize * rows) })
  }

  /// Mutable plane data including row padding (`linesize * rows` bytes)
  pub fn plane_data_mut(&mut self, plane: usize) -> Option<&mut [u8]> {
    let linesize = self.linesize(plane);
    let rows = self.plane_rows(plane)?;
    let ptr = self.data_mut(plane);
    if ptr.is_null() || linesize <= 0 {
      return None;
    }
    Some(unsafe { std::slice::from_raw_parts_mut(ptr, linesize as usize * rows) })
  }
}

impl Drop for Frame {
  fn drop(&mut self) {
    unsafe {
      let mut ptr = self.ptr.as_ptr();
      av_frame_free(&mut ptr);
    }
    live::released(Resource::Frame);
  }
}

// Frame data can be sent between threads
unsafe impl Send for Frame {}

impl std::fmt::Debug for Frame {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Frame")
      .field("width", &self.width())
      .field("height", &self.height())
      .field("format", &self.format())
      .field("pts", &self.pts())
      .field("key_frame", &self.is_key_frame())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_frame_allocation() {
    let frame = Frame::new().unwrap();
    assert_eq!(frame.width(), 0);
    assert_eq!(frame.height(), 0);
    assert!(frame.plane_data(0).is_none());
  }

  #[test]
  fn test_video_frame_has_padded_planes() {
    let frame = Frame::new_video(15, 9, AVPixelFormat::Yuv420p).unwrap();
    assert_eq!(frame.width(), 15);
    assert_eq!(frame.height(), 9);
    assert_eq!(frame.format(), AVPixelFormat::Yuv420p);

    assert!(frame.linesize(0) >= 15);
    assert!(frame.linesize(1) >= 8);
    assert_eq!(frame.plane_data(0).unwrap().len(), frame.linesize(0) as usize * 9);
    assert_eq!(frame.plane_data(2).unwrap().len(), frame.linesize(2) as usize * 5);
    assert!(frame.plane_data(3).is_none());
  }

  #[test]
  fn test_mark_key_frame() {
    let mut frame = Frame::new_video(16, 16, AVPixelFormat::Yuv420p).unwrap();
    frame.set_pts(0);
    frame.mark_key_frame();
    assert!(frame.is_key_frame());
    assert_eq!(frame.pict_type(), AVPictureType::I);
    assert_eq!(frame.pts(), 0);
  }

  #[test]
  fn test_out_of_range_size_is_rejected() {
    let before = live::snapshot();
    let err = Frame::new_video(i32::MAX as u32 + 1, 16, AVPixelFormat::Yuv420p).unwrap_err();
    assert_eq!(err.code, ffi::error::AVERROR_EINVAL);
    assert!(Frame::new_video(16, u32::MAX, AVPixelFormat::Yuv420p).is_err());
    assert_eq!(live::snapshot(), before);
  }

  #[test]
  fn test_frames_are_released() {
    let before = live::snapshot();
    for _ in 0..8 {
      let _frame = Frame::new_video(32, 32, AVPixelFormat::Yuv420p).unwrap();
    }
    assert_eq!(live::snapshot(), before);
  }
}

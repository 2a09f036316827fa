//! Pixel format conversion between caller layouts and VP8's YUV 4:2:0
//!
//! RGB24 goes through swscale (bilinear). I420 input is already in the
//! codec's format and is copied plane by plane into the frame's padded rows.

use crate::ffi::{
  swscale::{sws_freeContext, sws_getContext, sws_scale, SWS_BILINEAR},
  AVPixelFormat, SwsContext,
};
use std::os::raw::c_int;
use std::ptr::NonNull;

use super::layout::{OwnedImage, PixelLayout, RawImage};
use super::live::{self, Resource};
use super::{CodecError, CodecResult, Frame};

/// Safe wrapper around SwsContext for same-size pixel format conversion
pub struct Scaler {
  ptr: NonNull<SwsContext>,
  width: u32,
  height: u32,
  src_format: c_int,
  dst_format: AVPixelFormat,
}

impl Scaler {
  /// Create a converter between two pixel formats at a fixed size
  pub fn new(
    width: u32,
    height: u32,
    src_format: AVPixelFormat,
    dst_format: AVPixelFormat,
  ) -> CodecResult<Self> {
    Self::with_raw_source(width, height, src_format.as_raw(), dst_format)
  }

  /// Same as `new`, with the source given as a raw `AVPixelFormat` value.
  ///
  /// Decoders may hand back formats outside `AVPixelFormat`'s subset;
  /// swscale accepts any of them.
  fn with_raw_source(
    width: u32,
    height: u32,
    src_format: c_int,
    dst_format: AVPixelFormat,
  ) -> CodecResult<Self> {
    let (w, h) = match (c_int::try_from(width), c_int::try_from(height)) {
      (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
      _ => {
        return Err(CodecError::ConversionContext(format!(
          "Cannot convert a {}x{} image",
          width, height
        )))
      }
    };

    let ptr = unsafe {
      sws_getContext(
        w,
        h,
        src_format,
        w,
        h,
        dst_format.as_raw(),
        SWS_BILINEAR,
        std::ptr::null_mut(),
        std::ptr::null_mut(),
        std::ptr::null(),
      )
    };

    let ptr = NonNull::new(ptr).ok_or_else(|| {
      CodecError::ConversionContext(format!(
        "Failed to create conversion context from pixel format {} to {:?} at {}x{}",
        src_format, dst_format, width, height
      ))
    })?;
    live::acquired(Resource::Scaler);

    Ok(Self {
      ptr,
      width,
      height,
      src_format,
      dst_format,
    })
  }

  /// Convert a tightly packed single-plane image into a freshly allocated frame
  pub fn packed_to_frame(&self, data: &[u8], stride: usize) -> CodecResult<Frame> {
    let stride = c_int::try_from(stride)
      .map_err(|_| CodecError::ConversionContext(format!("Row stride {} is too large", stride)))?;

    let mut dst = alloc_frame(self.width, self.height, self.dst_format)?;

    let src_data: [*const u8; 4] = [data.as_ptr(), std::ptr::null(), std::ptr::null(), std::ptr::null()];
    let src_linesize: [c_int; 4] = [stride, 0, 0, 0];
    let dst_data: [*mut u8; 4] = [dst.data_mut(0), dst.data_mut(1), dst.data_mut(2), dst.data_mut(3)];
    let dst_linesize: [c_int; 4] = [
      dst.linesize(0),
      dst.linesize(1),
      dst.linesize(2),
      dst.linesize(3),
    ];

    self.run(&src_data, &src_linesize, &dst_data, &dst_linesize)?;
    Ok(dst)
  }

  /// Convert a frame into a tightly packed single-plane buffer
  pub fn frame_to_packed(&self, src: &Frame, bytes_per_pixel: usize) -> CodecResult<Vec<u8>> {
    if src.width() != self.width || src.height() != self.height {
      return Err(CodecError::ConversionContext(format!(
        "Frame is {}x{} but the conversion context expects {}x{}",
        src.width(),
        src.height(),
        self.width,
        self.height
      )));
    }

    let row = self.width as usize * bytes_per_pixel;
    let stride = c_int::try_from(row)
      .map_err(|_| CodecError::ConversionContext(format!("Row stride {} is too large", row)))?;
    let mut out = vec![0u8; row * self.height as usize];

    let src_data: [*const u8; 4] = [src.data(0), src.data(1), src.data(2), src.data(3)];
    let src_linesize: [c_int; 4] = [
      src.linesize(0),
      src.linesize(1),
      src.linesize(2),
      src.linesize(3),
    ];
    let dst_data: [*mut u8; 4] = [
      out.as_mut_ptr(),
      std::ptr::null_mut(),
      std::ptr::null_mut(),
      std::ptr::null_mut(),
    ];
    let dst_linesize: [c_int; 4] = [stride, 0, 0, 0];

    self.run(&src_data, &src_linesize, &dst_data, &dst_linesize)?;
    Ok(out)
  }

  fn run(
    &self,
    src_data: &[*const u8; 4],
    src_linesize: &[c_int; 4],
    dst_data: &[*mut u8; 4],
    dst_linesize: &[c_int; 4],
  ) -> CodecResult<()> {
    let rows = unsafe {
      sws_scale(
        self.ptr.as_ptr(),
        src_data.as_ptr(),
        src_linesize.as_ptr(),
        0,
        self.height as c_int,
        dst_data.as_ptr(),
        dst_linesize.as_ptr(),
      )
    };

    if rows != self.height as c_int {
      return Err(CodecError::ConversionContext(format!(
        "Conversion produced {} rows instead of {}",
        rows, self.height
      )));
    }
    Ok(())
  }

  // ========================================================================
  // Accessors
  // ========================================================================

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn dst_format(&self) -> AVPixelFormat {
    self.dst_format
  }
}

impl Drop for Scaler {
  fn drop(&mut self) {
    unsafe { sws_freeContext(self.ptr.as_ptr()) };
    live::released(Resource::Scaler);
  }
}

// The context is only used from one thread at a time
unsafe impl Send for Scaler {}

impl std::fmt::Debug for Scaler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Scaler")
      .field("width", &self.width)
      .field("height", &self.height)
      .field("src_format", &self.src_format)
      .field("dst_format", &self.dst_format)
      .finish()
  }
}

// ============================================================================
// Layout Conversion
// ============================================================================

/// Convert a caller image into a YUV 4:2:0 frame the VP8 encoder accepts
pub fn to_codec_format(image: &RawImage<'_>) -> CodecResult<Frame> {
  match image.layout() {
    PixelLayout::Rgb24 => {
      let scaler = Scaler::new(
        image.width(),
        image.height(),
        AVPixelFormat::Rgb24,
        AVPixelFormat::Yuv420p,
      )?;
      scaler.packed_to_frame(image.data(), image.width() as usize * 3)
    }
    PixelLayout::I420 => copy_i420(image),
  }
}

/// Convert a decoded frame into a tightly packed caller image
pub fn from_codec_format(frame: &Frame, target: PixelLayout) -> CodecResult<OwnedImage> {
  if target != PixelLayout::Rgb24 {
    return Err(CodecError::InvalidArgument(format!(
      "Decoded frames can only be converted to RGB24, not {}",
      target
    )));
  }

  let source = frame.format_raw();
  if source < 0 {
    return Err(CodecError::ConversionContext(
      "Decoded frame has no pixel format".to_string(),
    ));
  }

  let scaler = Scaler::with_raw_source(frame.width(), frame.height(), source, AVPixelFormat::Rgb24)?;
  let data = scaler.frame_to_packed(frame, 3)?;

  Ok(OwnedImage {
    width: frame.width(),
    height: frame.height(),
    layout: target,
    data,
  })
}

/// Copy tightly packed I420 planes into the frame's stride-padded planes
fn copy_i420(image: &RawImage<'_>) -> CodecResult<Frame> {
  let planes = image.i420_planes().ok_or_else(|| {
    CodecError::ConversionContext(format!("Expected an I420 image, got {}", image.layout()))
  })?;

  let mut frame = alloc_frame(image.width(), image.height(), AVPixelFormat::Yuv420p)?;

  for (index, (src, row_width)) in planes.into_iter().enumerate() {
    let linesize = frame.linesize(index) as usize;
    let dst = frame.plane_data_mut(index).ok_or_else(|| {
      CodecError::ConversionContext(format!("Frame plane {} is not allocated", index))
    })?;

    for (src_row, dst_row) in src.chunks_exact(row_width).zip(dst.chunks_mut(linesize)) {
      dst_row[..row_width].copy_from_slice(src_row);
    }
  }

  Ok(frame)
}

fn alloc_frame(width: u32, height: u32, format: AVPixelFormat) -> CodecResult<Frame> {
  Frame::new_video(width, height, format).map_err(|e| {
    CodecError::ConversionContext(format!(
      "Failed to allocate {:?} frame of {}x{}: {}",
      format, width, height, e
    ))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::codec::ErrorKind;

  fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    rgb.iter().copied().cycle().take(width as usize * height as usize * 3).collect()
  }

  #[test]
  fn test_rgb24_round_trip_through_yuv() {
    let data = solid_rgb(16, 16, [255, 0, 0]);
    let image = RawImage::new(&data, 16, 16, PixelLayout::Rgb24).unwrap();

    let frame = to_codec_format(&image).unwrap();
    assert_eq!(frame.format(), AVPixelFormat::Yuv420p);
    assert_eq!((frame.width(), frame.height()), (16, 16));

    let back = from_codec_format(&frame, PixelLayout::Rgb24).unwrap();
    assert_eq!(back.data.len(), 16 * 16 * 3);
    let [r, g, b] = back.first_pixel().unwrap();
    assert!(r >= 200 && g <= 50 && b <= 50, "got {:?}", (r, g, b));
  }

  #[test]
  fn test_i420_copy_respects_linesize() {
    // 15x9: odd sizes force padded rows and rounded-up chroma planes
    let len = PixelLayout::I420.buffer_size(15, 9).unwrap();
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    let image = RawImage::new(&data, 15, 9, PixelLayout::I420).unwrap();

    let frame = to_codec_format(&image).unwrap();
    let [(y, _), (u, uw), (v, _)] = image.i420_planes().unwrap();

    let luma = frame.plane_data(0).unwrap();
    let stride = frame.linesize(0) as usize;
    for row in 0..9 {
      assert_eq!(&luma[row * stride..row * stride + 15], &y[row * 15..row * 15 + 15]);
    }

    let chroma_stride = frame.linesize(1) as usize;
    let frame_u = frame.plane_data(1).unwrap();
    let frame_v = frame.plane_data(2).unwrap();
    for row in 0..5 {
      assert_eq!(&frame_u[row * chroma_stride..][..uw], &u[row * uw..][..uw]);
      assert_eq!(&frame_v[row * chroma_stride..][..uw], &v[row * uw..][..uw]);
    }
  }

  #[test]
  fn test_odd_size_rgb24_conversion() {
    let data = solid_rgb(15, 9, [10, 200, 30]);
    let image = RawImage::new(&data, 15, 9, PixelLayout::Rgb24).unwrap();
    let frame = to_codec_format(&image).unwrap();
    let back = from_codec_format(&frame, PixelLayout::Rgb24).unwrap();
    assert_eq!((back.width, back.height), (15, 9));
    assert_eq!(back.data.len(), 15 * 9 * 3);
  }

  #[test]
  fn test_decode_target_must_be_rgb24() {
    let frame = Frame::new_video(4, 4, AVPixelFormat::Yuv420p).unwrap();
    let err = from_codec_format(&frame, PixelLayout::I420).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
  }

  #[test]
  fn test_empty_frame_is_a_conversion_error() {
    let frame = Frame::new().unwrap();
    let err = from_codec_format(&frame, PixelLayout::Rgb24).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConversionContext);
  }

  #[test]
  fn test_rejected_conversions_release_native_resources() {
    let empty = Frame::new().unwrap();
    let before = live::snapshot();
    for _ in 0..16 {
      // Not a pixel format swscale knows
      let err = Scaler::with_raw_source(8, 8, 100_000, AVPixelFormat::Rgb24).unwrap_err();
      assert_eq!(err.kind(), ErrorKind::ConversionContext);

      let err = from_codec_format(&empty, PixelLayout::Rgb24).unwrap_err();
      assert_eq!(err.kind(), ErrorKind::ConversionContext);

      let err = Scaler::new(0, 8, AVPixelFormat::Rgb24, AVPixelFormat::Yuv420p).unwrap_err();
      assert_eq!(err.kind(), ErrorKind::ConversionContext);
    }
    assert_eq!(live::snapshot(), before);
  }

  #[test]
  fn test_conversions_release_native_resources() {
    let before = live::snapshot();
    let data = solid_rgb(8, 8, [0, 0, 255]);
    for _ in 0..16 {
      let image = RawImage::new(&data, 8, 8, PixelLayout::Rgb24).unwrap();
      let frame = to_codec_format(&image).unwrap();
      let _ = from_codec_format(&frame, PixelLayout::Rgb24).unwrap();
    }
    assert_eq!(live::snapshot(), before);
  }
}

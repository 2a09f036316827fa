//! Caller-facing pixel layouts and their buffer size rules

use super::{CodecError, CodecResult};
use crate::ffi::AVPixelFormat;
use std::fmt;

/// Pixel layout of a caller-supplied or caller-returned image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelLayout {
  /// Packed 8-bit RGB, 3 bytes per pixel, no row padding
  #[default]
  Rgb24,
  /// Planar YUV 4:2:0: full Y plane, then U and V at ceil(w/2) x ceil(h/2)
  I420,
}

impl PixelLayout {
  /// Parse the layout names accepted at the boundary (`"RGB24"`, `"I420"`)
  pub fn parse(name: &str) -> CodecResult<Self> {
    if name.eq_ignore_ascii_case("rgb24") {
      Ok(Self::Rgb24)
    } else if name.eq_ignore_ascii_case("i420") {
      Ok(Self::I420)
    } else {
      Err(CodecError::InvalidArgument(format!(
        "Unsupported pixel layout \"{}\" (expected \"RGB24\" or \"I420\")",
        name
      )))
    }
  }

  /// Name used in results handed back to the caller
  pub fn as_str(&self) -> &'static str {
    match self {
      PixelLayout::Rgb24 => "rgb24",
      PixelLayout::I420 => "i420",
    }
  }

  /// Matching FFmpeg pixel format
  pub fn pixel_format(&self) -> AVPixelFormat {
    match self {
      PixelLayout::Rgb24 => AVPixelFormat::Rgb24,
      PixelLayout::I420 => AVPixelFormat::Yuv420p,
    }
  }

  /// Exact byte length of a tightly packed image of this layout.
  ///
  /// `None` when the size does not fit in `usize`.
  pub fn buffer_size(&self, width: u32, height: u32) -> Option<usize> {
    let w = width as usize;
    let h = height as usize;
    match self {
      PixelLayout::Rgb24 => w.checked_mul(h)?.checked_mul(3),
      PixelLayout::I420 => {
        let luma = w.checked_mul(h)?;
        let chroma = chroma_dim(width).checked_mul(chroma_dim(height))?;
        luma.checked_add(chroma.checked_mul(2)?)
      }
    }
  }
}

impl fmt::Display for PixelLayout {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PixelLayout::Rgb24 => f.write_str("RGB24"),
      PixelLayout::I420 => f.write_str("I420"),
    }
  }
}

/// Chroma plane extent for 4:2:0 subsampling (rounds up for odd sizes)
#[inline]
pub fn chroma_dim(dim: u32) -> usize {
  (dim as usize).div_ceil(2)
}

pub(crate) fn size_mismatch_message(
  layout: &PixelLayout,
  width: &u32,
  height: &u32,
  expected: &usize,
  actual: &usize,
) -> String {
  match layout {
    PixelLayout::Rgb24 => format!(
      "Invalid RGB24 buffer size: expected {} bytes ({}x{}x3), got {}",
      expected, width, height, actual
    ),
    PixelLayout::I420 => format!(
      "Invalid I420 buffer size: expected {} bytes (Y {}x{} + U/V {}x{}), got {}",
      expected,
      width,
      height,
      chroma_dim(*width),
      chroma_dim(*height),
      actual
    ),
  }
}

/// A borrowed, size-checked still image
#[derive(Debug, Clone, Copy)]
pub struct RawImage<'a> {
  width: u32,
  height: u32,
  layout: PixelLayout,
  data: &'a [u8],
}

impl<'a> RawImage<'a> {
  /// Wrap caller bytes, checking dimensions and the exact byte length
  pub fn new(data: &'a [u8], width: u32, height: u32, layout: PixelLayout) -> CodecResult<Self> {
    if width == 0 || height == 0 {
      return Err(CodecError::InvalidArgument(format!(
        "Image dimensions must be positive, got {}x{}",
        width, height
      )));
    }

    let expected = layout.buffer_size(width, height).ok_or_else(|| {
      CodecError::InvalidArgument(format!("Image dimensions {}x{} are too large", width, height))
    })?;

    if data.len() != expected {
      return Err(CodecError::InvalidBufferSize {
        layout,
        width,
        height,
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      width,
      height,
      layout,
      data,
    })
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn layout(&self) -> PixelLayout {
    self.layout
  }

  pub fn data(&self) -> &'a [u8] {
    self.data
  }

  /// Split an I420 image into its Y, U and V planes with their row widths
  pub(crate) fn i420_planes(&self) -> Option<[(&'a [u8], usize); 3]> {
    if self.layout != PixelLayout::I420 {
      return None;
    }
    let luma = self.width as usize * self.height as usize;
    let chroma_w = chroma_dim(self.width);
    let chroma = chroma_w * chroma_dim(self.height);
    let (y, rest) = self.data.split_at(luma);
    let (u, v) = rest.split_at(chroma);
    Some([(y, self.width as usize), (u, chroma_w), (v, chroma_w)])
  }
}

/// An owned, tightly packed image produced by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedImage {
  pub width: u32,
  pub height: u32,
  pub layout: PixelLayout,
  pub data: Vec<u8>,
}

impl OwnedImage {
  /// Channel values of the top-left pixel (RGB24 only)
  pub fn first_pixel(&self) -> Option<[u8; 3]> {
    match (self.layout, self.data.get(..3)) {
      (PixelLayout::Rgb24, Some(&[r, g, b])) => Some([r, g, b]),
      _ => None,
    }
  }
}

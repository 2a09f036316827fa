//! Read-only queries over the codecs compiled into the linked FFmpeg

use crate::ffi::{
  accessors::{ffcodec_get_long_name, ffcodec_get_name, ffcodec_get_type},
  avcodec::{
    av_codec_is_decoder, av_codec_is_encoder, av_codec_iterate, avcodec_version,
    find_decoder_by_name, find_encoder_by_name,
  },
  avutil::{avutil_version, unpack_version},
  swscale::swscale_version,
  AVCodec, AVMediaType,
};
use std::ffi::{c_void, CStr};
use std::os::raw::c_char;

/// One registered encoder or decoder implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecDescriptor {
  pub name: String,
  pub long_name: Option<String>,
  pub media_type: AVMediaType,
  pub is_encoder: bool,
  pub is_decoder: bool,
}

impl CodecDescriptor {
  /// # Safety
  /// `codec` must be a non-null pointer returned by libavcodec.
  unsafe fn from_raw(codec: *const AVCodec) -> Self {
    Self {
      name: c_string(ffcodec_get_name(codec)).unwrap_or_default(),
      long_name: c_string(ffcodec_get_long_name(codec)),
      media_type: AVMediaType::from_raw(ffcodec_get_type(codec)),
      is_encoder: av_codec_is_encoder(codec) != 0,
      is_decoder: av_codec_is_decoder(codec) != 0,
    }
  }

  /// Coarse media category: `video`, `audio`, `subtitle` or `unknown`
  pub fn media_type_name(&self) -> &'static str {
    match self.media_type {
      AVMediaType::Video => "video",
      AVMediaType::Audio => "audio",
      AVMediaType::Subtitle => "subtitle",
      _ => "unknown",
    }
  }
}

/// Iterator over every codec registered in libavcodec, in registration order
pub struct Codecs {
  opaque: *mut c_void,
}

impl Iterator for Codecs {
  type Item = CodecDescriptor;

  fn next(&mut self) -> Option<Self::Item> {
    let codec = unsafe { av_codec_iterate(&mut self.opaque) };
    if codec.is_null() {
      None
    } else {
      Some(unsafe { CodecDescriptor::from_raw(codec) })
    }
  }
}

pub fn codecs() -> Codecs {
  Codecs {
    opaque: std::ptr::null_mut(),
  }
}

/// Codecs whose short name contains `filter` (all codecs when empty)
pub fn list_codecs(filter: Option<&str>) -> Vec<CodecDescriptor> {
  let filter = filter.unwrap_or("");
  codecs().filter(|c| c.name.contains(filter)).collect()
}

/// Availability of an encoder and decoder registered under `name`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecLookup {
  /// Descriptive name of the decoder, when one exists
  pub decoder: Option<String>,
  /// Descriptive name of the encoder, when one exists
  pub encoder: Option<String>,
}

pub fn find_by_name(name: &str) -> CodecLookup {
  CodecLookup {
    decoder: display_name(find_decoder_by_name(name)),
    encoder: display_name(find_encoder_by_name(name)),
  }
}

/// Runtime versions of the linked libraries,
/// e.g. `libavcodec 61.19.100, libavutil 59.39.100, libswscale 8.3.100`
pub fn ffmpeg_version_string() -> String {
  let libs = [
    ("libavcodec", unsafe { avcodec_version() }),
    ("libavutil", unsafe { avutil_version() }),
    ("libswscale", unsafe { swscale_version() }),
  ];
  libs
    .iter()
    .map(|(lib, packed)| {
      let (major, minor, micro) = unpack_version(*packed);
      format!("{} {}.{}.{}", lib, major, minor, micro)
    })
    .collect::<Vec<_>>()
    .join(", ")
}

/// Long name, falling back to the short name
fn display_name(codec: *const AVCodec) -> Option<String> {
  if codec.is_null() {
    return None;
  }
  unsafe { c_string(ffcodec_get_long_name(codec)).or_else(|| c_string(ffcodec_get_name(codec))) }
}

/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn c_string(ptr: *const c_char) -> Option<String> {
  if ptr.is_null() {
    None
  } else {
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_vp8_is_registered() {
    let vp8 = list_codecs(Some("vp8"));
    assert!(vp8.iter().any(|c| c.is_decoder && c.name == "vp8"));
    assert!(vp8.iter().all(|c| c.name.contains("vp8")));
    assert!(vp8.iter().all(|c| c.media_type_name() == "video"));
  }

  #[test]
  fn test_listing_is_stable() {
    let first = list_codecs(None);
    let second = list_codecs(None);
    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(list_codecs(Some("")).len(), first.len());
  }

  #[test]
  fn test_find_by_name() {
    let lookup = find_by_name("libvpx");
    assert!(lookup.encoder.is_some());

    let missing = find_by_name("definitely-not-a-codec");
    assert_eq!(missing, CodecLookup::default());

    assert_eq!(find_by_name("nul\0name"), CodecLookup::default());
  }

  #[test]
  fn test_version_string() {
    let version = ffmpeg_version_string();
    assert!(version.starts_with("libavcodec "));
    assert!(version.contains(", libavutil "));
    assert!(version.contains(", libswscale "));
    assert!(!version.contains("libavformat"));
  }
}

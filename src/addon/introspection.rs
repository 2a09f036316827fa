//! Load check and codec availability queries

use napi_derive::napi;

use crate::codec::{init, registry};

/// Result of `hasCodec`
#[napi(object)]
pub struct CodecAvailability {
  pub decoder: bool,
  pub encoder: bool,
  /// Descriptive name of the decoder, when present
  pub decoder_name: Option<String>,
  /// Descriptive name of the encoder, when present
  pub encoder_name: Option<String>,
}

/// One entry of `listCodecs`
#[napi(object)]
pub struct CodecInfo {
  pub name: String,
  /// Empty when FFmpeg has no descriptive name
  pub long_name: String,
  pub is_encoder: bool,
  pub is_decoder: bool,
  /// `"video"`, `"audio"`, `"subtitle"` or `"unknown"`
  #[napi(js_name = "type")]
  pub codec_type: String,
}

impl From<registry::CodecDescriptor> for CodecInfo {
  fn from(codec: registry::CodecDescriptor) -> Self {
    Self {
      codec_type: codec.media_type_name().to_string(),
      name: codec.name,
      long_name: codec.long_name.unwrap_or_default(),
      is_encoder: codec.is_encoder,
      is_decoder: codec.is_decoder,
    }
  }
}

/// Confirms the addon loaded
#[napi]
pub fn hello() -> String {
  "Hello from WebCodecs native addon!".to_string()
}

/// Versions of the linked FFmpeg libraries
#[napi(js_name = "getFFmpegVersion")]
pub fn get_ffmpeg_version() -> String {
  init::ensure_initialized();
  registry::ffmpeg_version_string()
}

/// Whether FFmpeg has an encoder and/or decoder registered under `name`
#[napi]
pub fn has_codec(name: String) -> CodecAvailability {
  init::ensure_initialized();
  let lookup = registry::find_by_name(&name);
  CodecAvailability {
    decoder: lookup.decoder.is_some(),
    encoder: lookup.encoder.is_some(),
    decoder_name: lookup.decoder,
    encoder_name: lookup.encoder,
  }
}

/// Registered codecs whose name contains `filter`, in FFmpeg's order
#[napi]
pub fn list_codecs(filter: Option<String>) -> Vec<CodecInfo> {
  init::ensure_initialized();
  registry::list_codecs(filter.as_deref())
    .into_iter()
    .map(CodecInfo::from)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hello() {
    assert_eq!(hello(), "Hello from WebCodecs native addon!");
  }

  #[test]
  fn test_has_codec_vp8() {
    let vp8 = has_codec("vp8".to_string());
    assert!(vp8.decoder);
    assert!(vp8.decoder_name.is_some());

    let missing = has_codec("no-such-codec".to_string());
    assert!(!missing.decoder && !missing.encoder);
    assert!(missing.decoder_name.is_none() && missing.encoder_name.is_none());
  }

  #[test]
  fn test_list_codecs_filter() {
    let all = list_codecs(None);
    let vp = list_codecs(Some("vp".to_string()));
    assert!(vp.len() <= all.len());
    assert!(vp.iter().all(|c| c.name.contains("vp")));
    assert!(vp.iter().any(|c| c.codec_type == "video"));

    let names: Vec<_> = list_codecs(None).into_iter().map(|c| c.name).collect();
    let again: Vec<_> = all.into_iter().map(|c| c.name).collect();
    assert_eq!(names, again);
  }
}

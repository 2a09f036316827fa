//! Process-wide FFmpeg setup
//!
//! Codec registration is static in every FFmpeg this crate links against,
//! so the only global state is libav's log level. It is set once, on the
//! first pipeline or introspection call.

use crate::ffi::avutil::{av_log_set_level, log_level};
use std::os::raw::c_int;
use std::sync::Once;

/// Environment variable selecting FFmpeg's own log verbosity
pub const LOG_LEVEL_ENV: &str = "VP8_FRAME_FFMPEG_LOG_LEVEL";

/// FFmpeg log level used when the environment does not choose one
pub const DEFAULT_LOG_LEVEL: c_int = log_level::ERROR;

static INIT: Once = Once::new();

/// Run the one-time setup. Safe to call from any thread, any number of times.
pub fn ensure_initialized() {
  INIT.call_once(|| {
    let requested = std::env::var(LOG_LEVEL_ENV).ok();
    let level = match requested.as_deref() {
      Some(name) => parse_log_level(name).unwrap_or_else(|| {
        tracing::warn!(
          target: "vp8_frame",
          "Ignoring unknown {} value {:?}",
          LOG_LEVEL_ENV,
          name
        );
        DEFAULT_LOG_LEVEL
      }),
      None => DEFAULT_LOG_LEVEL,
    };

    unsafe { av_log_set_level(level) };
    tracing::debug!(target: "vp8_frame", level, "FFmpeg initialized");
  });
}

/// Map a level name to libav's numeric level
pub fn parse_log_level(name: &str) -> Option<c_int> {
  let level = match name.trim().to_ascii_lowercase().as_str() {
    "quiet" => log_level::QUIET,
    "panic" => log_level::PANIC,
    "fatal" => log_level::FATAL,
    "error" => log_level::ERROR,
    "warning" | "warn" => log_level::WARNING,
    "info" => log_level::INFO,
    "verbose" => log_level::VERBOSE,
    "debug" => log_level::DEBUG,
    "trace" => log_level::TRACE,
    _ => return None,
  };
  Some(level)
}

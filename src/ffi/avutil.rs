//! libavutil function declarations
//!
//! Frames, error strings, logging and version queries.

use super::types::*;
use std::os::raw::{c_char, c_int, c_uint};

extern "C" {
    // ========================================================================
    // Frame Management
    // ========================================================================

    /// Allocate an AVFrame and set its fields to default values
    pub fn av_frame_alloc() -> *mut AVFrame;

    /// Free the frame and any dynamically allocated objects in it
    pub fn av_frame_free(frame: *mut *mut AVFrame);

    /// Allocate new buffers for video data based on frame format/dimensions
    ///
    /// # Arguments
    /// * `frame` - Frame with format, width, height set
    /// * `align` - Buffer size alignment (0 for default, 32 recommended for SIMD)
    pub fn av_frame_get_buffer(frame: *mut AVFrame, align: c_int) -> c_int;

    /// Ensure the frame is writable, copying data if needed
    pub fn av_frame_make_writable(frame: *mut AVFrame) -> c_int;

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Put a description of the AVERROR code errnum in errbuf
    ///
    /// # Returns
    /// 0 on success, negative if no description was found
    pub fn av_strerror(errnum: c_int, errbuf: *mut c_char, errbuf_size: usize) -> c_int;

    // ========================================================================
    // Logging
    // ========================================================================

    /// Set the logging level
    pub fn av_log_set_level(level: c_int);

    /// Get the current logging level
    pub fn av_log_get_level() -> c_int;

    // ========================================================================
    // Version
    // ========================================================================

    /// Packed LIBAVUTIL_VERSION_INT of the linked library
    pub fn avutil_version() -> c_uint;
}

// ============================================================================
// Logging Levels
// ============================================================================

pub mod log_level {
    use std::os::raw::c_int;

    pub const QUIET: c_int = -8;
    pub const PANIC: c_int = 0;
    pub const FATAL: c_int = 8;
    pub const ERROR: c_int = 16;
    pub const WARNING: c_int = 24;
    pub const INFO: c_int = 32;
    pub const VERBOSE: c_int = 40;
    pub const DEBUG: c_int = 48;
    pub const TRACE: c_int = 56;
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Split a packed `AV_VERSION_INT` into (major, minor, micro)
pub fn unpack_version(version: c_uint) -> (u32, u32, u32) {
    (version >> 16, (version >> 8) & 0xff, version & 0xff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_version() {
        // AV_VERSION_INT(60, 31, 102)
        let packed = (60 << 16) | (31 << 8) | 102;
        assert_eq!(unpack_version(packed), (60, 31, 102));
    }
}

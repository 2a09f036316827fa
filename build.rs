//! Build script for vp8-frame-node
//!
//! Handles:
//! 1. NAPI-RS setup
//! 2. Compiling the C accessor library via `cc`
//! 3. Static linking of FFmpeg (avcodec, avutil, swscale) and libvpx

use std::env;
use std::path::{Path, PathBuf};

/// FFmpeg libraries the pipeline calls into. Order matters for static linking.
const FFMPEG_LIBS: [&str; 3] = ["avcodec", "swscale", "avutil"];

/// Codec libraries FFmpeg may have been configured with.
/// Only libvpx is required; the rest are linked when present so that a
/// full-featured static FFmpeg build still resolves.
const CODEC_LIBS: [(&str, bool); 8] = [
  ("vpx", true),
  ("x264", false),
  ("x265", false),
  ("aom", false),
  ("dav1d", false),
  ("opus", false),
  ("mp3lame", false),
  ("webp", false),
];

fn main() {
  napi_build::setup();

  let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
  let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

  let ffmpeg_dir = get_ffmpeg_dir(&target_os, &target_arch);

  compile_accessors(&ffmpeg_dir);
  link_ffmpeg(&ffmpeg_dir, &target_os);

  println!("cargo:rerun-if-changed=src/ffi/accessors.c");
  println!("cargo:rerun-if-changed=build.rs");
  println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
  println!("cargo:rerun-if-env-changed=LIBRARY_PATH");
}

/// Locate the FFmpeg installation (headers in `include/`, static libs in `lib/`)
fn get_ffmpeg_dir(target_os: &str, target_arch: &str) -> PathBuf {
  if let Ok(dir) = env::var("FFMPEG_DIR") {
    return PathBuf::from(dir);
  }

  #[cfg(unix)]
  {
    if let Ok(output) = std::process::Command::new("pkg-config")
      .args(["--variable=prefix", "libavcodec"])
      .output()
    {
      if output.status.success() {
        let prefix = String::from_utf8_lossy(&output.stdout);
        let path = PathBuf::from(prefix.trim());
        if path.exists() {
          return path;
        }
      }
    }
  }

  let common_paths = match target_os {
    "macos" => vec!["/opt/homebrew", "/usr/local", "/opt/local"],
    "linux" => vec!["/usr", "/usr/local", "/opt/ffmpeg"],
    "windows" => vec!["C:\\ffmpeg", "C:\\Program Files\\ffmpeg"],
    _ => vec![],
  };

  for path in common_paths {
    let p = PathBuf::from(path);
    if p.join("include/libavcodec/avcodec.h").exists() {
      return p;
    }
  }

  // Bundled FFmpeg in the project directory
  let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
  let platform = match (target_os, target_arch) {
    ("macos", "aarch64") => "darwin-arm64",
    ("macos", "x86_64") => "darwin-x64",
    ("linux", "x86_64") => "linux-x64",
    ("linux", "aarch64") => "linux-arm64",
    ("windows", "x86_64") => "win32-x64",
    _ => "unknown",
  };

  let bundled = manifest_dir.join("ffmpeg").join(platform);
  if bundled.exists() {
    return bundled;
  }

  println!(
    "cargo:warning=FFmpeg not found. Set FFMPEG_DIR environment variable or install FFmpeg."
  );
  PathBuf::from("/usr/local")
}

/// Compile the C accessor library
fn compile_accessors(ffmpeg_dir: &Path) {
  let mut build = cc::Build::new();
  build
    .file("src/ffi/accessors.c")
    .include(ffmpeg_dir.join("include"))
    .warnings(true)
    .extra_warnings(true);

  #[cfg(target_os = "macos")]
  {
    build.flag("-Wno-deprecated-declarations");
  }

  build.compile("ffmpeg_accessors");
}

fn link_ffmpeg(ffmpeg_dir: &Path, target_os: &str) {
  link_static_ffmpeg(&ffmpeg_dir.join("lib"), target_os);
  link_platform_libraries(target_os);
}

/// Link FFmpeg statically using full paths to .a files
fn link_static_ffmpeg(lib_dir: &Path, target_os: &str) {
  for lib in FFMPEG_LIBS {
    let static_lib = lib_dir.join(format!("lib{}.a", lib));
    if !static_lib.exists() {
      panic!(
        "Static library lib{}.a not found at {}. \
         Set FFMPEG_DIR to an FFmpeg installation with static libs.",
        lib,
        lib_dir.display()
      );
    }
    println!("cargo:rustc-link-arg={}", static_lib.display());
  }

  let search_paths = get_codec_library_paths(target_os);
  let mut linked_x265 = false;

  for (lib, required) in CODEC_LIBS {
    match find_static_lib_path(lib, &search_paths) {
      Some(path) => {
        println!("cargo:rustc-link-arg={}", path.display());
        linked_x265 |= lib == "x265";
      }
      None if required => panic!(
        "Required static library lib{}.a not found. Searched paths: {:?}",
        lib, search_paths
      ),
      None => {}
    }
  }

  // x265 requires the C++ runtime
  if linked_x265 {
    match target_os {
      "macos" => println!("cargo:rustc-link-lib=c++"),
      "linux" => println!("cargo:rustc-link-lib=stdc++"),
      _ => {}
    }
  }
}

/// Codec library search paths
fn get_codec_library_paths(target_os: &str) -> Vec<PathBuf> {
  let mut paths = Vec::new();

  if let Ok(ffmpeg_dir) = env::var("FFMPEG_DIR") {
    paths.push(PathBuf::from(ffmpeg_dir).join("lib"));
  }

  if let Ok(lib_path) = env::var("LIBRARY_PATH") {
    paths.extend(env::split_paths(&lib_path));
  }

  match target_os {
    "macos" => {
      paths.push(PathBuf::from("/opt/homebrew/lib"));
      paths.push(PathBuf::from("/usr/local/lib"));
      paths.push(PathBuf::from("/opt/local/lib"));
    }
    "linux" => {
      paths.push(PathBuf::from("/usr/lib"));
      paths.push(PathBuf::from("/usr/local/lib"));
      paths.push(PathBuf::from("/usr/lib/x86_64-linux-gnu"));
      paths.push(PathBuf::from("/usr/lib/aarch64-linux-gnu"));
    }
    _ => {}
  }

  if let Ok(brew_prefix) = env::var("HOMEBREW_PREFIX") {
    paths.push(PathBuf::from(brew_prefix).join("lib"));
  }

  paths
}

fn find_static_lib_path(name: &str, paths: &[PathBuf]) -> Option<PathBuf> {
  let static_name = format!("lib{}.a", name);
  paths
    .iter()
    .map(|path| path.join(&static_name))
    .find(|full_path| full_path.exists())
}

/// Link platform-specific system libraries
fn link_platform_libraries(target_os: &str) {
  match target_os {
    "macos" => {
      for framework in ["CoreFoundation", "CoreMedia", "CoreVideo", "VideoToolbox", "Security"] {
        println!("cargo:rustc-link-lib=framework={}", framework);
      }
      println!("cargo:rustc-link-lib=iconv");
    }
    "linux" => {
      for lib in ["m", "pthread", "dl"] {
        println!("cargo:rustc-link-lib={}", lib);
      }
    }
    "windows" => {
      for lib in ["bcrypt", "ole32", "user32", "ws2_32", "secur32", "advapi32"] {
        println!("cargo:rustc-link-lib={}", lib);
      }
    }
    _ => {
      println!("cargo:warning=Unknown target OS: {}", target_os);
    }
  }
}

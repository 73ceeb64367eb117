//! Build script for detecting external tools and providing installation guidance.
//!
//! The video subcommands shell out to ffmpeg and ffprobe at runtime; the
//! `video` feature additionally links `OpenCV`, found through pkg-config.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Runtime tools used by convert/duration
    check_tool("ffmpeg");
    check_tool("ffprobe");

    // OpenCV is only linked with the video feature
    if env::var_os("CARGO_FEATURE_VIDEO").is_some() {
        check_pkg_config();
        check_opencv();
    }

    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
}

fn check_tool(tool: &str) {
    let output = Command::new(tool).arg("-version").output();

    match output {
        Ok(output) if output.status.success() => {
            let banner = String::from_utf8_lossy(&output.stdout);
            let first_line = banner.lines().next().unwrap_or_default();
            println!("cargo:warning=Found {}", first_line.trim());
        }
        _ => {
            println!("cargo:warning={tool} not found. Video conversion and probing will fail at runtime.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install ffmpeg");
            println!("cargo:warning=On macOS: brew install ffmpeg");
        }
    }
}

fn check_opencv() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
    println!("cargo:rerun-if-env-changed=OPENCV_LINK_PATHS");
    println!("cargo:rerun-if-env-changed=OPENCV_INCLUDE_PATHS");

    let found = ["opencv4", "opencv"].iter().find_map(|package| {
        let output = Command::new("pkg-config").args(["--modversion", package]).output().ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    });

    match found {
        Some(version) => println!("cargo:warning=Found OpenCV version: {version}"),
        None => {
            println!("cargo:warning=OpenCV not found via pkg-config. Make sure OpenCV is installed.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libopencv-dev clang libclang-dev");
            println!("cargo:warning=On macOS: brew install opencv");
        }
    }
}

fn check_pkg_config() {
    let output = Command::new("pkg-config").arg("--version").output();

    match output {
        Ok(output) if output.status.success() => {}
        _ => {
            println!("cargo:warning=pkg-config not found. This is required to find OpenCV.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
            println!("cargo:warning=On macOS: brew install pkg-config");
        }
    }
}

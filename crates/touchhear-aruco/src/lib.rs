//! ArUco fiducial detection.
//!
//! This crate covers the full path from a grayscale frame to decoded markers:
//! - embedded built-in dictionaries (compiled into the binary),
//! - candidate extraction (adaptive threshold, dark components, quad fit),
//! - per-quad bit sampling and matching against the dictionary.

pub mod builtins;
mod components;
mod decode;
mod detector;
mod dictionary;
mod matcher;
mod quad;
mod threshold;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use detector::{ArucoDetector, ArucoDetectorParams, MarkerDetection};
pub use dictionary::Dictionary;
pub use matcher::{rotate_code_u64, Match, Matcher};

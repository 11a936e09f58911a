//! Core types and utilities for the TouchHear sheet pipeline.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about markers, sensors or regions; it provides the image views, planar
//! transforms and polygon helpers the higher-level crates are built from.

mod affine;
mod depth;
mod homography;
mod hull;
mod image;
mod logger;
mod mask;
mod stats;

pub use affine::AffineTransform;
pub use depth::{DepthImage, DepthImageView};
pub use homography::{estimate_homography, homography_from_4pt, Homography};
pub use hull::{convex_hull, polygon_area};
pub use image::{rgb_to_gray, GrayImage, GrayImageView};
pub use mask::RegionMask;
pub use stats::{mean_u8, median_f32};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;

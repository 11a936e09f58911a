//! Interactive touch surface built from a printed A4 sheet.
//!
//! Four fiducial markers at the sheet corners give a pixel-to-millimeter
//! mapping; a depth sensor (or, without one, the fingertip's shadow) decides
//! whether a tracked fingertip touches the paper; touched points are tested
//! against author-defined regions that trigger audio.
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::time::Instant;
//! use touchhear::{SensorFrame, TouchHearConfig};
//! use nalgebra::Point2;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TouchHearConfig::load_json("touchhear.json")?;
//! let mut processor = config.build_processor()?;
//!
//! let frame = SensorFrame {
//!     color: image::open("frame.png")?.to_rgb8(),
//!     depth: None,
//! };
//! let out = processor.process(&frame, &[Point2::new(320.0, 240.0)], Instant::now());
//! println!("{}", serde_json::to_string_pretty(&out.result)?);
//! # Ok(())
//! # }
//! ```
//!
//! For a live sensor, hand a [`FrameSource`] to [`DetectorService::start`];
//! it runs the frame loop on its own thread and publishes snapshots.
//!
//! ## API map
//! - `fiducial`: corner markers from a color frame.
//! - `calibration`: smoothed sheet-plane depth.
//! - `mapping`: pixel to sheet millimeters (affine or projective).
//! - `contact`: depth and shadow contact classifiers.
//! - `regions`: authored regions, hit-testing and cooldowns.
//! - `pipeline`: the per-frame processor and its result snapshot.
//! - `service`: the threaded frame loop.
//! - `sensor`, `hands`, `audio`, `project`: collaborator traits and simple
//!   implementations.

pub mod audio;
pub mod calibration;
pub mod config;
pub mod contact;
pub mod fiducial;
pub mod hands;
pub mod mapping;
pub mod overlay;
pub mod pipeline;
pub mod project;
pub mod regions;
pub mod sensor;
pub mod service;
pub mod sheet;

#[cfg(test)]
mod test_support;

pub use touchhear_aruco as aruco;
pub use touchhear_core as core;

pub use audio::{AudioSink, LogAudioSink, Trigger};
pub use calibration::{CalibrationParams, CalibrationState, PlaneCalibrator};
pub use config::{ConfigError, TouchHearConfig};
pub use contact::{ContactClassifier, ContactState, ContactStrategy};
pub use fiducial::{FiducialLocator, FiducialObservation};
pub use hands::{FingertipDetector, HandLandmarks, LandmarkFingertipDetector, ScriptedFingertips};
pub use mapping::{CoordinateMapper, PlaneTransform, TransformKind};
pub use pipeline::{DetectionResult, FrameOutput, FrameProcessor, TouchPoint};
pub use project::{DirectoryProjectStore, LoadedProject, Project, ProjectError, ProjectStore};
pub use regions::{Region, RegionHitTester, RegionLayout, RegionShape};
pub use sensor::{FrameSource, ReplaySource, SensorError, SensorFrame, SensorSession};
pub use service::{AnnotatedFrames, DetectorService, RuntimeParams, ServiceError};
pub use sheet::{PhysicalSheet, SheetCorner};

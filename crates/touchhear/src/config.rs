//! JSON configuration for a TouchHear session.

use crate::calibration::{CalibrationParams, PlaneCalibrator};
use crate::contact::ContactStrategy;
use crate::fiducial::FiducialLocator;
use crate::mapping::CoordinateMapper;
use crate::pipeline::FrameProcessor;
use crate::regions::{AuthoringCanvas, RegionHitTester};
use crate::service::RuntimeParams;
use crate::sheet::PhysicalSheet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use touchhear_aruco::builtins::{builtin_dictionary, BUILTIN_DICTIONARY_NAMES};
use touchhear_aruco::{ArucoDetectorParams, Dictionary};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("unknown dictionary {name:?} (available: {available:?})")]
    UnknownDictionary {
        name: String,
        available: &'static [&'static str],
    },
    #[error("cooldown must be a finite, non-negative number of seconds (got {0})")]
    InvalidCooldown(f32),
}

/// Authoring canvas and trigger cooldown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionSettings {
    pub canvas: AuthoringCanvas,
    pub cooldown_s: f32,
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            canvas: AuthoringCanvas::default(),
            cooldown_s: 1.0,
        }
    }
}

fn default_dictionary() -> String {
    "DICT_4X4_50".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchHearConfig {
    /// Built-in marker dictionary name.
    pub dictionary: String,
    pub sheet: PhysicalSheet,
    pub aruco: ArucoDetectorParams,
    pub calibration: CalibrationParams,
    pub contact: ContactStrategy,
    pub regions: RegionSettings,
    pub runtime: RuntimeParams,
}

impl Default for TouchHearConfig {
    fn default() -> Self {
        Self {
            dictionary: default_dictionary(),
            sheet: PhysicalSheet::default(),
            aruco: ArucoDetectorParams::default(),
            calibration: CalibrationParams::default(),
            contact: ContactStrategy::default(),
            regions: RegionSettings::default(),
            runtime: RuntimeParams::default(),
        }
    }
}

impl TouchHearConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn dictionary(&self) -> Result<Dictionary, ConfigError> {
        builtin_dictionary(&self.dictionary).ok_or_else(|| ConfigError::UnknownDictionary {
            name: self.dictionary.clone(),
            available: BUILTIN_DICTIONARY_NAMES,
        })
    }

    pub fn cooldown(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f32(self.regions.cooldown_s)
            .map_err(|_| ConfigError::InvalidCooldown(self.regions.cooldown_s))
    }

    /// A fresh processor with no project regions loaded.
    pub fn build_processor(&self) -> Result<FrameProcessor, ConfigError> {
        Ok(FrameProcessor::new(
            FiducialLocator::new(self.dictionary()?, self.aruco.clone()),
            PlaneCalibrator::new(self.calibration.clone()),
            CoordinateMapper::new(self.sheet),
            self.contact.build(),
            RegionHitTester::new(self.cooldown()?),
        ))
    }
}

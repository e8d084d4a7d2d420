use crate::image_transformation::affine::Rotation;
use crate::verification::comparator::MatchPolicy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to open config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Everything a verification session needs to know about the frames and the model.
///
/// Missing fields in a JSON config fall back to the defaults, which describe a 640x480 camera
/// frame fed to a 300x300 model without rotation or letterboxing.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Side of the square model input.
    pub crop_size: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub sensor_orientation: Rotation,
    pub maintain_aspect_ratio: bool,
    /// Detections scoring below this are dropped by the detector.
    pub confidence_threshold: f32,
    pub nms_iou_threshold: f32,
    pub match_policy: MatchPolicy,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        VerificationConfig {
            crop_size: 300,
            frame_width: 640,
            frame_height: 480,
            sensor_orientation: Rotation::Deg0,
            maintain_aspect_ratio: false,
            confidence_threshold: 0.25,
            nms_iou_threshold: 0.45,
            match_policy: MatchPolicy::FirstMatch,
        }
    }
}

impl VerificationConfig {
    pub fn from_json_file(filepath: &Path) -> Result<Self, ConfigError> {
        let file = File::open(filepath).map_err(|source| ConfigError::Read {
            path: filepath.to_path_buf(),
            source,
        })?;
        let config: VerificationConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ConfigError::Parse {
                path: filepath.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crop_size == 0 || self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "crop and frame sizes must be positive, got crop {} and frame {}x{}",
                self.crop_size, self.frame_width, self.frame_height
            )));
        }
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("nms_iou_threshold", self.nms_iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

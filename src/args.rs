use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use visual_search_verifier::config::VerificationConfig;
use visual_search_verifier::image_transformation::affine::Rotation;
use visual_search_verifier::verification::comparator::MatchPolicy;
use visual_search_verifier::verification::golden::{GoldenCase, discover_cases};

/// Checks detector output against golden expectation files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory of golden cases: every image with a sibling `<stem>_results.txt`
    #[arg(long, value_name = "DIR", conflicts_with_all = ["image", "expected"])]
    pub golden_dir: Option<PathBuf>,

    /// Single image to verify
    #[arg(long, value_name = "FILE", requires = "expected")]
    pub image: Option<PathBuf>,

    /// Expectations for --image
    #[arg(long, value_name = "FILE", requires = "image")]
    pub expected: Option<PathBuf>,

    /// Replay detections (model input coordinates) from a file instead of running a model
    #[arg(long, value_name = "FILE")]
    pub recorded: Option<PathBuf>,

    /// ONNX detection model
    #[cfg(feature = "onnx")]
    #[arg(long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Class names of the ONNX model, one per line
    #[cfg(feature = "onnx")]
    #[arg(long, value_name = "FILE")]
    pub classes: Option<PathBuf>,

    /// JSON session config; flags below override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Side of the square model input
    #[arg(long, value_name = "PIXELS")]
    pub crop_size: Option<u32>,

    #[arg(long, value_name = "PIXELS")]
    pub frame_width: Option<u32>,

    #[arg(long, value_name = "PIXELS")]
    pub frame_height: Option<u32>,

    /// Sensor orientation in degrees (multiple of 90)
    #[arg(long, value_name = "DEGREES", allow_negative_numbers = true)]
    pub orientation: Option<i32>,

    /// Letterbox the frame instead of stretching it (`--maintain-aspect-ratio=false` to stretch)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub maintain_aspect_ratio: Option<bool>,

    /// Detector confidence threshold (0.0 - 1.0)
    #[arg(long, value_name = "THRESHOLD")]
    pub confidence: Option<f32>,

    /// Let each candidate satisfy at most one expectation
    #[arg(long)]
    pub exclusive: bool,

    /// Write the full JSON report here
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Save the mapped detections of --image as a new expectations file
    #[arg(long, value_name = "FILE", requires = "image")]
    pub write_detections: Option<PathBuf>,
}

impl Args {
    pub fn resolve_config(&self) -> Result<VerificationConfig> {
        let mut config = match &self.config {
            Some(path) => VerificationConfig::from_json_file(path)?,
            None => VerificationConfig::default(),
        };
        if let Some(crop_size) = self.crop_size {
            config.crop_size = crop_size;
        }
        if let Some(frame_width) = self.frame_width {
            config.frame_width = frame_width;
        }
        if let Some(frame_height) = self.frame_height {
            config.frame_height = frame_height;
        }
        if let Some(orientation) = self.orientation {
            config.sensor_orientation = Rotation::try_from(orientation)?;
        }
        if let Some(maintain_aspect_ratio) = self.maintain_aspect_ratio {
            config.maintain_aspect_ratio = maintain_aspect_ratio;
        }
        if let Some(confidence) = self.confidence {
            config.confidence_threshold = confidence;
        }
        if self.exclusive {
            config.match_policy = MatchPolicy::Exclusive;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn cases(&self) -> Result<Vec<GoldenCase>> {
        match (&self.golden_dir, &self.image, &self.expected) {
            (Some(dir), _, _) => {
                let cases = discover_cases(dir)
                    .with_context(|| format!("Failed to scan {}", dir.display()))?;
                if cases.is_empty() {
                    anyhow::bail!("No golden cases found under {}", dir.display());
                }
                Ok(cases)
            }
            (None, Some(image), Some(expected)) => {
                Ok(vec![GoldenCase::new(image.clone(), expected.clone())])
            }
            _ => anyhow::bail!("Pass either --golden-dir or both --image and --expected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_file(name: &str, json: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("args-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, json).unwrap();
        path
    }

    fn parse(flags: &[&str]) -> Args {
        let argv = ["visual-search-verifier", "--recorded", "crop.txt"];
        Args::try_parse_from(argv.iter().chain(flags)).unwrap()
    }

    #[test]
    fn flags_override_config_file_values() {
        let path = config_file(
            "override",
            r#"{"crop_size": 320, "frame_width": 1280, "maintain_aspect_ratio": true}"#,
        );
        let path = path.to_str().unwrap();

        let config = parse(&["--config", path, "--crop-size", "416", "--orientation", "-90"])
            .resolve_config()
            .unwrap();
        assert_eq!(config.crop_size, 416);
        assert_eq!(config.frame_width, 1280);
        assert_eq!(config.frame_height, VerificationConfig::default().frame_height);
        assert_eq!(config.sensor_orientation, Rotation::Deg270);
        assert!(config.maintain_aspect_ratio);

        let config = parse(&["--config", path, "--maintain-aspect-ratio=false"])
            .resolve_config()
            .unwrap();
        assert!(!config.maintain_aspect_ratio);
    }

    #[test]
    fn bare_aspect_ratio_flag_enables_letterboxing() {
        let args = parse(&["--maintain-aspect-ratio", "--exclusive"]);
        assert_eq!(args.maintain_aspect_ratio, Some(true));
        let config = args.resolve_config().unwrap();
        assert!(config.maintain_aspect_ratio);
        assert_eq!(config.match_policy, MatchPolicy::Exclusive);
        assert!(!parse(&[]).resolve_config().unwrap().maintain_aspect_ratio);
    }

    #[test]
    fn invalid_override_is_rejected() {
        assert!(parse(&["--orientation", "45"]).resolve_config().is_err());
        assert!(parse(&["--confidence", "1.5"]).resolve_config().is_err());
    }
}

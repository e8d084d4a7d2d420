use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::detection::Detection;
use crate::config::{ConfigError, VerificationConfig};
use crate::image_transformation::affine::{AffineTransform, GeometryError};
use crate::image_transformation::frame_mapping::FrameMapping;
use crate::image_transformation::warp::warp_into_crop;
use crate::image_utils::image_conversion::convert_rgb_image_to_owned_array;
use crate::image_utils::image_io::read_image_as_rgb8;
use crate::object_detection::object_detection_model::{DetectionError, ObjectDetectionModel};
use crate::verification::comparator::match_expectations;
use crate::verification::expectations::{FixtureError, load_expectations};
use crate::verification::golden::GoldenCase;
use crate::verification::report::{CaseReport, SuiteReport};
use image::RgbImage;
use ndarray::Array4;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("Failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
}

/// Holds the frame/crop transforms, computed once, and runs golden cases through a detector.
#[derive(Clone, Debug)]
pub struct VerificationSession {
    config: VerificationConfig,
    mapping: FrameMapping,
}

impl VerificationSession {
    pub fn new(config: VerificationConfig) -> Result<Self, VerifyError> {
        config.validate()?;
        let mapping = FrameMapping::new(
            config.frame_width,
            config.frame_height,
            config.crop_size,
            config.crop_size,
            config.sensor_orientation,
            config.maintain_aspect_ratio,
        )?;
        info!(
            "Frame {}x{} -> crop {}x{}, frame to crop {}",
            config.frame_width,
            config.frame_height,
            config.crop_size,
            config.crop_size,
            mapping.frame_to_crop
        );
        Ok(VerificationSession { config, mapping })
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    pub fn frame_to_crop(&self) -> &AffineTransform {
        &self.mapping.frame_to_crop
    }

    pub fn crop_to_frame(&self) -> &AffineTransform {
        &self.mapping.crop_to_frame
    }

    /// Warps a source frame into the model input crop and lays it out as a tensor.
    pub fn prepare_input(&self, frame: &RgbImage) -> Result<Array4<f32>, VerifyError> {
        if frame.dimensions() != (self.config.frame_width, self.config.frame_height) {
            warn!(
                "Frame is {}x{} but the session expects {}x{}; mapping with the configured size.",
                frame.width(),
                frame.height(),
                self.config.frame_width,
                self.config.frame_height
            );
        }
        let crop = warp_into_crop(
            frame,
            &self.mapping.frame_to_crop,
            self.config.crop_size,
            self.config.crop_size,
        )?;
        Ok(convert_rgb_image_to_owned_array(&crop))
    }

    /// Maps detections from model input space back into source frame space.
    pub fn map_to_frame(
        &self,
        candidates: &[Detection<BoundingBox>],
    ) -> Result<Vec<Detection<BoundingBox>>, GeometryError> {
        candidates
            .iter()
            .map(|d| self.mapping.crop_to_frame.map_detection(d))
            .collect()
    }

    /// Compares detections produced in model input space against source frame expectations.
    pub fn verify_detections(
        &self,
        name: &str,
        model_name: &str,
        expected: &[Detection<BoundingBox>],
        candidates_in_crop: &[Detection<BoundingBox>],
    ) -> Result<CaseReport, VerifyError> {
        let candidates = self.map_to_frame(candidates_in_crop)?;
        let outcomes = match_expectations(expected, &candidates, self.config.match_policy);
        Ok(CaseReport::new(
            name.to_string(),
            model_name.to_string(),
            self.config.match_policy,
            candidates,
            outcomes,
        ))
    }

    /// Loads the image and expectations of a case, runs the model and compares the results.
    pub fn run_case<M: ObjectDetectionModel + ?Sized>(
        &self,
        model: &mut M,
        case: &GoldenCase,
    ) -> Result<CaseReport, VerifyError> {
        let frame = read_image_as_rgb8(&case.image_path).map_err(|source| VerifyError::Image {
            path: case.image_path.clone(),
            source,
        })?;
        let expected = load_expectations(&case.expectations_path)?;
        let input = self.prepare_input(&frame)?;
        let candidates = model.run_inference(input.view(), self.config.confidence_threshold)?;
        let report =
            self.verify_detections(&case.name, model.model_name(), &expected, &candidates)?;
        if report.passed {
            info!("{}", report);
        } else {
            warn!("{}", report);
        }
        Ok(report)
    }

    pub fn run_suite<M: ObjectDetectionModel + ?Sized>(
        &self,
        model: &mut M,
        cases: &[GoldenCase],
    ) -> Result<SuiteReport, VerifyError> {
        let mut suite = SuiteReport::default();
        for case in cases {
            suite.cases.push(self.run_case(model, case)?);
        }
        Ok(suite)
    }
}

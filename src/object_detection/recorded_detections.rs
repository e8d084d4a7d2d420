use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::detection::Detection;
use crate::object_detection::object_detection_model::{DetectionError, ObjectDetectionModel};
use crate::verification::expectations::{FixtureError, load_expectations};
use ndarray::ArrayView4;
use std::path::Path;
use tracing::debug;

/// Replays a fixed list of detections instead of running a model.
///
/// The detections are stored in model input coordinates, in the same text format as the golden
/// expectations. Useful for checking the mapping and matching logic without a model file.
#[derive(Clone, Debug)]
pub struct RecordedDetections {
    name: String,
    detections: Vec<Detection<BoundingBox>>,
}

impl RecordedDetections {
    pub fn new(name: String, detections: Vec<Detection<BoundingBox>>) -> Self {
        RecordedDetections { name, detections }
    }

    pub fn from_file(filepath: &Path) -> Result<Self, FixtureError> {
        let detections = load_expectations(filepath)?;
        Ok(RecordedDetections {
            name: format!("recorded {}", filepath.display()),
            detections,
        })
    }
}

impl ObjectDetectionModel for RecordedDetections {
    fn run_inference(
        &mut self,
        input_array: ArrayView4<f32>,
        confidence: f32,
    ) -> Result<Vec<Detection<BoundingBox>>, DetectionError> {
        debug!("Replaying detections for input of shape {:?}", input_array.shape());
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= confidence)
            .cloned()
            .collect())
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::detection::Detection;
use ndarray::ArrayView4;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime failed: {0}")]
    Ort(#[from] ort::Error),
    #[error("Model output has unexpected shape {shape:?}.")]
    UnexpectedOutputShape { shape: Vec<usize> },
    #[error("Input tensor has shape {actual:?}, the model expects {expected:?}.")]
    UnexpectedInputShape {
        expected: [usize; 4],
        actual: [usize; 4],
    },
}

/// Defines a trait that all object detection models must follow.
pub trait ObjectDetectionModel {
    /// Runs the model on one image laid out as (1, channel, row, column) with values in [0, 1].
    ///
    /// run_inference takes a view rather than an owned array so that crops of a larger image can
    /// be passed without copying. The returned detections are in model input pixel coordinates
    /// and only those scoring at least `confidence` are kept.
    fn run_inference(
        &mut self,
        input_array: ArrayView4<f32>,
        confidence: f32,
    ) -> Result<Vec<Detection<BoundingBox>>, DetectionError>;

    fn model_name(&self) -> &str;
}

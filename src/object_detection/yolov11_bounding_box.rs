use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::detection::Detection;
use crate::object_detection::object_detection_model::{DetectionError, ObjectDetectionModel};
use crate::object_detection::object_detection_utils::non_maximum_suppression;
use crate::object_detection::ort_inference_session::OrtInferenceSession;
use ndarray::{ArrayView4, Axis};
use ort::value::TensorRef;
use std::path::Path;
use tracing::{debug, warn};

/// A YOLOv11 style detector exported to ONNX.
///
/// The model takes `images` of shape (1, 3, input_height, input_width) and produces `output0`
/// of shape (1, 4 + classes, anchors), where each anchor holds a centre/size box in input pixels
/// followed by one score per class.
pub struct Yolov11BoundingBox {
    ort_session: OrtInferenceSession,
    class_names: Vec<String>,
    input_width: usize,
    input_height: usize,
    nms_iou_threshold: f32,
    model_name: String,
}

impl Yolov11BoundingBox {
    pub fn new(
        model_path: &Path,
        class_names: Vec<String>,
        input_width: usize,
        input_height: usize,
        nms_iou_threshold: f32,
        model_name: String,
    ) -> ort::Result<Self> {
        let ort_session = OrtInferenceSession::new(model_path)?;
        Ok(Yolov11BoundingBox {
            ort_session,
            class_names,
            input_width,
            input_height,
            nms_iou_threshold,
            model_name,
        })
    }
}

impl ObjectDetectionModel for Yolov11BoundingBox {
    fn run_inference(
        &mut self,
        input_array: ArrayView4<f32>,
        confidence: f32,
    ) -> Result<Vec<Detection<BoundingBox>>, DetectionError> {
        let shape = input_array.shape();
        let actual = [shape[0], shape[1], shape[2], shape[3]];
        let expected = [1, 3, self.input_height, self.input_width];
        if actual != expected {
            return Err(DetectionError::UnexpectedInputShape { expected, actual });
        }

        let input = input_array.as_standard_layout().into_owned();
        let outputs = self
            .ort_session
            .session
            .run(ort::inputs!["images" => TensorRef::from_array_view(&input)?])?;
        let output = outputs["output0"].try_extract_array::<f32>()?;
        if output.ndim() != 3 || output.shape()[0] != 1 || output.shape()[1] < 5 {
            return Err(DetectionError::UnexpectedOutputShape {
                shape: output.shape().to_vec(),
            });
        }

        // (1, 4 + classes, anchors) -> (anchors, 4 + classes, 1)
        let output = output.t();
        let mut detections: Vec<Detection<BoundingBox>> = Vec::new();
        for row in output.axis_iter(Axis(0)) {
            let row: Vec<f32> = row.iter().copied().collect();
            let Some((class_id, prob)) = row
                .iter()
                .skip(4) // skips bounding box coords.
                .copied()
                .enumerate()
                .reduce(|best, item| if item.1 > best.1 { item } else { best })
            else {
                continue;
            };
            if prob < confidence {
                continue;
            }
            let label = match self.class_names.get(class_id) {
                Some(v) => v.clone(),
                None => class_id.to_string(),
            };
            let (x, y, w, h) = (row[0], row[1], row[2], row[3]);
            match BoundingBox::new(x - w / 2.0, y - h / 2.0, x + w / 2.0, y + h / 2.0, label) {
                Ok(annotation) => detections.push(Detection {
                    annotation,
                    confidence: prob,
                }),
                Err(e) => warn!("Skipping malformed model output box: {}", e),
            }
        }
        let detections = non_maximum_suppression(detections, self.nms_iou_threshold);
        debug!("{} produced {} detections", self.model_name, detections.len());
        Ok(detections)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

use ort::session::Session;
use std::path::Path;
use tracing::info;

/// An onnxruntime inference session.
///
/// The ONNX detector in this crate is a thin wrapper around an ONNX inference session that
/// handles running the model on hardware.
pub struct OrtInferenceSession {
    pub session: Session,
}

impl OrtInferenceSession {
    pub fn new(model_path: &Path) -> ort::Result<Self> {
        let session = Session::builder()?.commit_from_file(model_path)?;
        info!("Loaded ONNX model from {}", model_path.display());
        Ok(Self { session })
    }
}

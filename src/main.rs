mod args;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::process::ExitCode;
use tracing::info;
use visual_search_verifier::config::VerificationConfig;
use visual_search_verifier::object_detection::object_detection_model::ObjectDetectionModel;
use visual_search_verifier::object_detection::recorded_detections::RecordedDetections;
use visual_search_verifier::verification::expectations::save_expectations;
use visual_search_verifier::verification::session::VerificationSession;

#[cfg(feature = "onnx")]
fn build_onnx_model(
    args: &args::Args,
    config: &VerificationConfig,
) -> Result<Option<Box<dyn ObjectDetectionModel>>> {
    use visual_search_verifier::object_detection::object_detection_utils::read_classes_txt_file;
    use visual_search_verifier::object_detection::yolov11_bounding_box::Yolov11BoundingBox;

    let Some(model_path) = &args.model else {
        return Ok(None);
    };
    let classes_path = args
        .classes
        .as_ref()
        .context("--classes is required with --model")?;
    let class_names = read_classes_txt_file(classes_path)
        .with_context(|| format!("Failed to read classes from {}", classes_path.display()))?;
    let crop_size = config.crop_size as usize;
    let model = Yolov11BoundingBox::new(
        model_path,
        class_names,
        crop_size,
        crop_size,
        config.nms_iou_threshold,
        model_path.display().to_string(),
    )
    .with_context(|| format!("Failed to load model {}", model_path.display()))?;
    Ok(Some(Box::new(model)))
}

#[cfg(not(feature = "onnx"))]
fn build_onnx_model(
    _args: &args::Args,
    _config: &VerificationConfig,
) -> Result<Option<Box<dyn ObjectDetectionModel>>> {
    Ok(None)
}

fn build_model(
    args: &args::Args,
    config: &VerificationConfig,
) -> Result<Box<dyn ObjectDetectionModel>> {
    if let Some(model) = build_onnx_model(args, config)? {
        if args.recorded.is_some() {
            anyhow::bail!("--model and --recorded cannot be used together");
        }
        return Ok(model);
    }
    match &args.recorded {
        Some(path) => Ok(Box::new(RecordedDetections::from_file(path)?)),
        None => anyhow::bail!("No detector given, pass --recorded FILE or --model FILE"),
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt::init();

    let args = args::Args::parse();
    let config = args.resolve_config()?;
    let session = VerificationSession::new(config)?;
    let mut model = build_model(&args, session.config())?;
    let cases = args.cases()?;
    info!("Verifying {} cases with {}", cases.len(), model.model_name());

    let suite = session.run_suite(model.as_mut(), &cases)?;
    println!("{suite}");

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&suite)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Report written to {}", path.display());
    }
    if let (Some(path), Some(case)) = (&args.write_detections, suite.cases.first()) {
        save_expectations(path, &case.candidates)?;
        info!("{} detections written to {}", case.candidates.len(), path.display());
    }

    Ok(if suite.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

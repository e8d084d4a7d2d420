use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Suffix joining an image stem to its expectation file, as in `table.jpg` / `table_results.txt`.
pub const EXPECTATIONS_SUFFIX: &str = "_results.txt";

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// An image paired with the detections it is expected to produce.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GoldenCase {
    pub name: String,
    pub image_path: PathBuf,
    pub expectations_path: PathBuf,
}

impl GoldenCase {
    pub fn new(image_path: PathBuf, expectations_path: PathBuf) -> Self {
        let name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| image_path.display().to_string());
        GoldenCase {
            name,
            image_path,
            expectations_path,
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Finds every image under `dir` that has a sibling `<stem>_results.txt`, sorted by path.
pub fn discover_cases(dir: &Path) -> Result<Vec<GoldenCase>, walkdir::Error> {
    let mut cases = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_image(path) {
            continue;
        }
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let expectations_path = path.with_file_name(format!("{stem}{EXPECTATIONS_SUFFIX}"));
        if expectations_path.is_file() {
            cases.push(GoldenCase::new(path.to_path_buf(), expectations_path));
        } else {
            debug!("Skipping {}: no {}", path.display(), expectations_path.display());
        }
    }
    Ok(cases)
}

use crate::annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
use crate::annotations::detection::Detection;
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read expectations from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write expectations to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn parse_finite(token: &str) -> Option<f32> {
    token.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Parses golden detections from whitespace separated records.
///
/// Each record is `<label> <left> <top> <right> <bottom> <confidence>`. Underscores in labels
/// stand for spaces. Parsing stops at the first record that is incomplete, has a non-numeric
/// value or describes an inverted box; every record before it is kept.
pub fn parse_expectations(text: &str) -> Vec<Detection<BoundingBox>> {
    let mut tokens = text.split_whitespace();
    let mut expectations = Vec::new();
    while let Some(raw_label) = tokens.next() {
        let category = raw_label.replace('_', " ");
        let values = tokens
            .by_ref()
            .take(5)
            .map(parse_finite)
            .collect::<Option<Vec<f32>>>()
            .and_then(|values| values.into_iter().collect_tuple());
        let Some((left, top, right, bottom, confidence)) = values else {
            warn!(
                "Stopped reading expectations at record {} ({}): missing or non-numeric values.",
                expectations.len(),
                raw_label
            );
            break;
        };
        match BoundingBox::new(left, top, right, bottom, category) {
            Ok(annotation) => expectations.push(Detection {
                annotation,
                confidence,
            }),
            Err(e) => {
                warn!(
                    "Stopped reading expectations at record {} ({}): {}",
                    expectations.len(),
                    raw_label,
                    e
                );
                break;
            }
        }
    }
    expectations
}

pub fn load_expectations(filepath: &Path) -> Result<Vec<Detection<BoundingBox>>, FixtureError> {
    let text = fs::read_to_string(filepath).map_err(|source| FixtureError::Read {
        path: filepath.to_path_buf(),
        source,
    })?;
    let expectations = parse_expectations(&text);
    debug!(
        "Loaded {} expectations from {}",
        expectations.len(),
        filepath.display()
    );
    Ok(expectations)
}

/// Renders detections in the fixture format, one record per line.
pub fn format_expectations<T: BoundingBoxGeometry>(detections: &[Detection<T>]) -> String {
    detections
        .iter()
        .map(|d| {
            format!(
                "{} {} {} {} {} {}",
                d.label().replace(' ', "_"),
                d.annotation.left(),
                d.annotation.top(),
                d.annotation.right(),
                d.annotation.bottom(),
                d.confidence
            )
        })
        .join("\n")
}

pub fn save_expectations<T: BoundingBoxGeometry>(
    filepath: &Path,
    detections: &[Detection<T>],
) -> Result<(), FixtureError> {
    let mut text = format_expectations(detections);
    text.push('\n');
    fs::write(filepath, text).map_err(|source| FixtureError::Write {
        path: filepath.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_across_lines() {
        let parsed = parse_expectations("cup 10 10 50 50 0.80\ndining_table 0 60.5\n 200 150 0.62\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].label(), "cup");
        assert_eq!(parsed[0].annotation.as_xyxy(), (10.0, 10.0, 50.0, 50.0));
        assert_eq!(parsed[0].confidence, 0.80);
        assert_eq!(parsed[1].label(), "dining table");
        assert_eq!(parsed[1].annotation.as_xyxy(), (0.0, 60.5, 200.0, 150.0));
    }

    #[test]
    fn underscore_label_matches_spaced_candidate() {
        use crate::verification::comparator::matches;
        let expected = parse_expectations("dining_table 0 60 200 150 0.62");
        let candidate = Detection {
            annotation: BoundingBox::new(0.0, 60.0, 200.0, 150.0, "dining table".to_string())
                .unwrap(),
            confidence: 0.62,
        };
        assert!(matches(&expected[0], &[candidate]));
    }

    #[test]
    fn stops_at_non_numeric_coordinate() {
        let parsed = parse_expectations("cup 10 10 50 50 0.8 bottle 1 two 3 4 0.5 chair 0 0 1 1 0.9");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].label(), "cup");
    }

    #[test]
    fn stops_at_truncated_record() {
        let parsed = parse_expectations("cup 10 10 50 50 0.8\nbottle 1 2 3");
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn stops_at_inverted_box() {
        let parsed = parse_expectations("cup 50 10 10 50 0.8 bottle 1 2 3 4 0.5");
        assert!(parsed.is_empty());
    }

    #[test]
    fn empty_input_has_no_expectations() {
        assert!(parse_expectations("  \n\t").is_empty());
    }

    #[test]
    fn formatted_records_parse_back() {
        let text = "dining_table 0 60.5 200 150 0.62\ncup 10 10 50 50 0.8";
        let parsed = parse_expectations(text);
        assert_eq!(format_expectations(&parsed), text);
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_expectations(Path::new("./no/such/table_results.txt"));
        assert!(matches!(result, Err(FixtureError::Read { .. })));
    }
}

use crate::annotations::bounding_box::BoundingBoxGeometry;
use crate::annotations::detection::Detection;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Reads a file with the class names into a vector so that the number ids
/// which come directly from the inference session can be given meaning.
///
/// Blank lines are skipped.
pub fn read_classes_txt_file(filepath: &Path) -> io::Result<Vec<String>> {
    let mut classes = Vec::new();
    for line in BufReader::new(File::open(filepath)?).lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            classes.push(name.to_string());
        }
    }
    Ok(classes)
}

/// Non maximum suppression is a way of removing duplicate detections.
///
/// Detections are visited from the most to the least confident; a detection is dropped when it
/// overlaps an already kept detection of the same category by more than `iou_threshold`.
pub fn non_maximum_suppression<T: BoundingBoxGeometry>(
    mut detections: Vec<Detection<T>>,
    iou_threshold: f32,
) -> Vec<Detection<T>> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection<T>> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = kept.iter().any(|k| {
            k.annotation.category() == candidate.annotation.category()
                && k.annotation.intersection_over_union(&candidate.annotation) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::bounding_box::BoundingBox;

    fn det(xyxy: [f32; 4], category: &str, confidence: f32) -> Detection<BoundingBox> {
        let [left, top, right, bottom] = xyxy;
        Detection {
            annotation: BoundingBox::new(left, top, right, bottom, category.to_string()).unwrap(),
            confidence,
        }
    }

    #[test]
    fn nms_no_overlap() {
        let dets = vec![det([0., 0., 1., 1.], "test", 0.6), det([2., 2., 3., 3.], "test", 0.6)];
        assert_eq!(non_maximum_suppression(dets.clone(), 0.5), dets);
    }

    #[test]
    fn nms_standard_usage() {
        let dets = vec![
            det([0., 0., 4., 4.], "test", 0.6),
            det([0., 0., 5., 5.], "test", 0.55),
            det([6., 6., 10., 10.], "test", 0.75),
        ];
        let expected = vec![det([6., 6., 10., 10.], "test", 0.75), det([0., 0., 4., 4.], "test", 0.6)];
        assert_eq!(non_maximum_suppression(dets, 0.5), expected);
    }

    #[test]
    fn nms_overlap_but_different_classes() {
        let dets = vec![
            det([0., 0., 4.5, 4.5], "test", 0.6),
            det([0., 0., 5., 5.], "test_different_class", 0.55),
            det([0.5, 0.5, 4., 4.], "test", 0.8),
            det([6., 6., 10., 10.], "test", 0.75),
        ];
        let expected = vec![
            det([0.5, 0.5, 4., 4.], "test", 0.8),
            det([6., 6., 10., 10.], "test", 0.75),
            det([0., 0., 5., 5.], "test_different_class", 0.55),
        ];
        assert_eq!(non_maximum_suppression(dets, 0.5), expected);
    }

    #[test]
    fn missing_classes_file_is_an_error() {
        assert!(read_classes_txt_file(Path::new("./no/such/labelmap.txt")).is_err());
    }
}

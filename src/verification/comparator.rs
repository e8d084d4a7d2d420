use crate::annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
use crate::annotations::detection::Detection;
use serde::{Deserialize, Serialize};

/// Absolute difference below which two confidences are considered equal.
pub const CONFIDENCE_TOLERANCE: f32 = 0.01;

/// Share of each box's own area that the overlap must exceed.
pub const MIN_OVERLAP_PROPORTION: f32 = 0.95;

/// How candidates are assigned to expectations.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Every expectation takes the first candidate that satisfies it. A candidate may satisfy
    /// several expectations.
    #[default]
    FirstMatch,
    /// Like `FirstMatch`, but a candidate is consumed by the first expectation it satisfies.
    /// Expectations are served in fixture order.
    Exclusive,
}

/// Labels are compared exactly. Fixture labels have already had underscores replaced by spaces.
pub fn labels_match(a: &str, b: &str) -> bool {
    a == b
}

pub fn confidences_match(a: f32, b: f32) -> bool {
    (a - b).abs() < CONFIDENCE_TOLERANCE
}

/// Two boxes match when their overlap covers more than 95% of each box.
///
/// This is stricter than an IoU threshold: a box that is much larger or much smaller than the
/// other is rejected even when their IoU is high. Boxes with zero area never match.
pub fn bounding_boxes_match(a: &impl BoundingBoxGeometry, b: &impl BoundingBoxGeometry) -> bool {
    let overlap = a.intersection_area(b);
    overlap > MIN_OVERLAP_PROPORTION * a.area() && overlap > MIN_OVERLAP_PROPORTION * b.area()
}

/// Which of the three criteria a candidate satisfies for an expectation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CriteriaCheck {
    pub label: bool,
    pub geometry: bool,
    pub confidence: bool,
}

impl CriteriaCheck {
    pub fn evaluate<A: BoundingBoxGeometry, B: BoundingBoxGeometry>(
        expected: &Detection<A>,
        candidate: &Detection<B>,
    ) -> Self {
        CriteriaCheck {
            label: labels_match(candidate.label(), expected.label()),
            geometry: bounding_boxes_match(&candidate.annotation, &expected.annotation),
            confidence: confidences_match(candidate.confidence, expected.confidence),
        }
    }

    pub fn all(&self) -> bool {
        self.label && self.geometry && self.confidence
    }
}

pub fn detection_matches<A: BoundingBoxGeometry, B: BoundingBoxGeometry>(
    expected: &Detection<A>,
    candidate: &Detection<B>,
) -> bool {
    CriteriaCheck::evaluate(expected, candidate).all()
}

/// Returns the first candidate, in produced order, that satisfies the expectation.
pub fn find_match<'a, A: BoundingBoxGeometry, B: BoundingBoxGeometry>(
    expected: &Detection<A>,
    candidates: &'a [Detection<B>],
) -> Option<(usize, &'a Detection<B>)> {
    candidates
        .iter()
        .enumerate()
        .find(|(_, candidate)| detection_matches(expected, *candidate))
}

pub fn matches<A: BoundingBoxGeometry, B: BoundingBoxGeometry>(
    expected: &Detection<A>,
    candidates: &[Detection<B>],
) -> bool {
    find_match(expected, candidates).is_some()
}

/// True when every expectation has at least one matching candidate.
///
/// Candidates that match no expectation are not penalised.
pub fn all_expectations_matched<A: BoundingBoxGeometry, B: BoundingBoxGeometry>(
    expected: &[Detection<A>],
    candidates: &[Detection<B>],
) -> bool {
    expected.iter().all(|e| matches(e, candidates))
}

/// The same-label candidate with the highest IoU, kept for diagnosing a failed expectation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NearMiss {
    pub candidate_index: usize,
    pub candidate: Detection<BoundingBox>,
    pub intersection_over_union: f32,
    pub confidence_delta: f32,
    pub criteria: CriteriaCheck,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExpectationOutcome {
    pub expected: Detection<BoundingBox>,
    pub matched_candidate: Option<usize>,
    pub near_miss: Option<NearMiss>,
}

impl ExpectationOutcome {
    pub fn is_matched(&self) -> bool {
        self.matched_candidate.is_some()
    }
}

/// Matches every expectation against the candidates and records how each one was resolved.
pub fn match_expectations(
    expected: &[Detection<BoundingBox>],
    candidates: &[Detection<BoundingBox>],
    policy: MatchPolicy,
) -> Vec<ExpectationOutcome> {
    let mut consumed = vec![false; candidates.len()];
    expected
        .iter()
        .map(|target| {
            let matched_candidate = candidates
                .iter()
                .enumerate()
                .filter(|(index, _)| policy == MatchPolicy::FirstMatch || !consumed[*index])
                .find(|(_, candidate)| detection_matches(target, *candidate))
                .map(|(index, _)| index);
            if let (MatchPolicy::Exclusive, Some(index)) = (policy, matched_candidate) {
                consumed[index] = true;
            }
            let near_miss = match matched_candidate {
                Some(_) => None,
                None => closest_same_label(target, candidates),
            };
            ExpectationOutcome {
                expected: target.clone(),
                matched_candidate,
                near_miss,
            }
        })
        .collect()
}

fn closest_same_label(
    target: &Detection<BoundingBox>,
    candidates: &[Detection<BoundingBox>],
) -> Option<NearMiss> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| labels_match(candidate.label(), target.label()))
        .map(|(index, candidate)| {
            (
                index,
                candidate,
                candidate.annotation.intersection_over_union(&target.annotation),
            )
        })
        .max_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(index, candidate, iou)| NearMiss {
            candidate_index: index,
            candidate: candidate.clone(),
            intersection_over_union: iou,
            confidence_delta: candidate.confidence - target.confidence,
            criteria: CriteriaCheck::evaluate(target, candidate),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(
        label: &str,
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        confidence: f32,
    ) -> Detection<BoundingBox> {
        Detection {
            annotation: BoundingBox::new(left, top, right, bottom, label.to_string()).unwrap(),
            confidence,
        }
    }

    #[test]
    fn confidence_tolerance_is_strict() {
        assert!(!confidences_match(0.01, 0.0));
        assert!(confidences_match(0.0099, 0.0));
        assert!(confidences_match(0.805, 0.80));
        assert!(!confidences_match(0.95, 0.80));
    }

    #[test]
    fn overlap_of_exactly_ninety_five_percent_is_rejected() {
        let a = det("cup", 0.0, 0.0, 100.0, 100.0, 0.5);
        let b = det("cup", 5.0, 0.0, 105.0, 100.0, 0.5);
        assert!(!bounding_boxes_match(&a.annotation, &b.annotation));
    }

    #[test]
    fn overlap_above_ninety_five_percent_is_accepted() {
        let a = det("cup", 0.0, 0.0, 100.0, 100.0, 0.5);
        let b = det("cup", 4.9, 0.0, 104.9, 100.0, 0.5);
        assert!(bounding_boxes_match(&a.annotation, &b.annotation));
        assert!(bounding_boxes_match(&b.annotation, &a.annotation));
    }

    #[test]
    fn undersized_box_is_rejected_even_with_high_iou() {
        let a = det("cup", 0.0, 0.0, 100.0, 100.0, 0.5);
        let b = det("cup", 0.0, 0.0, 100.0, 94.0, 0.5);
        assert!(a.annotation.intersection_over_union(&b.annotation) > 0.9);
        assert!(!bounding_boxes_match(&a.annotation, &b.annotation));
        assert!(!bounding_boxes_match(&b.annotation, &a.annotation));
    }

    #[test]
    fn zero_area_boxes_never_match() {
        let a = det("cup", 10.0, 10.0, 10.0, 50.0, 0.5);
        assert!(!bounding_boxes_match(&a.annotation, &a.annotation));
        let b = det("cup", 10.0, 10.0, 50.0, 50.0, 0.5);
        assert!(!bounding_boxes_match(&a.annotation, &b.annotation));
    }

    #[test]
    fn labels_are_case_sensitive() {
        assert!(labels_match("dining table", "dining table"));
        assert!(!labels_match("Cup", "cup"));
        assert!(!labels_match("dining_table", "dining table"));
    }

    #[test]
    fn matching_candidate_is_found() {
        let expected = det("cup", 10.0, 10.0, 50.0, 50.0, 0.80);
        let candidates = vec![det("cup", 11.0, 10.0, 50.0, 50.0, 0.805)];
        assert!(matches(&expected, &candidates));
    }

    #[test]
    fn confidence_outside_tolerance_fails_despite_geometry() {
        let expected = det("cup", 10.0, 10.0, 50.0, 50.0, 0.80);
        let candidates = vec![det("cup", 11.0, 10.0, 50.0, 50.0, 0.95)];
        assert!(!matches(&expected, &candidates));
    }

    #[test]
    fn box_covering_ninety_percent_of_expectation_fails() {
        // Overlap is 37 x 39 = 1443 against an expected area of 1600.
        let expected = det("cup", 10.0, 10.0, 50.0, 50.0, 0.80);
        let candidates = vec![det("cup", 12.0, 11.0, 49.0, 51.0, 0.805)];
        assert!(!matches(&expected, &candidates));
        let outcome = match_expectations(&[expected], &candidates, MatchPolicy::FirstMatch);
        let near_miss = outcome[0].near_miss.as_ref().unwrap();
        assert_eq!(
            near_miss.criteria,
            CriteriaCheck {
                label: true,
                geometry: false,
                confidence: true
            }
        );
    }

    #[test]
    fn missing_label_fails_the_whole_set() {
        let expected = vec![
            det("cup", 10.0, 10.0, 50.0, 50.0, 0.80),
            det("dining table", 0.0, 60.0, 200.0, 150.0, 0.62),
        ];
        let candidates = vec![det("cup", 10.0, 10.0, 50.0, 50.0, 0.80)];
        assert!(matches(&expected[0], &candidates));
        assert!(!matches(&expected[1], &candidates));
        assert!(!all_expectations_matched(&expected, &candidates));
        let outcome = match_expectations(&expected, &candidates, MatchPolicy::FirstMatch);
        assert_eq!(outcome[1].near_miss, None);
    }

    #[test]
    fn first_satisfying_candidate_wins() {
        let expected = det("cup", 10.0, 10.0, 50.0, 50.0, 0.80);
        let candidates = vec![
            det("bottle", 10.0, 10.0, 50.0, 50.0, 0.80),
            det("cup", 10.0, 10.0, 50.0, 50.0, 0.801),
            det("cup", 10.0, 10.0, 50.0, 50.0, 0.80),
        ];
        let (index, found) = find_match(&expected, &candidates).unwrap();
        assert_eq!(index, 1);
        assert_eq!(found.confidence, 0.801);
    }

    #[test]
    fn one_candidate_may_satisfy_several_expectations() {
        let expected = vec![
            det("cup", 10.0, 10.0, 50.0, 50.0, 0.80),
            det("cup", 10.0, 10.0, 50.0, 50.0, 0.80),
        ];
        let candidates = vec![det("cup", 10.0, 10.0, 50.0, 50.0, 0.80)];
        assert!(all_expectations_matched(&expected, &candidates));

        let first = match_expectations(&expected, &candidates, MatchPolicy::FirstMatch);
        assert_eq!(first[0].matched_candidate, Some(0));
        assert_eq!(first[1].matched_candidate, Some(0));

        let exclusive = match_expectations(&expected, &candidates, MatchPolicy::Exclusive);
        assert_eq!(exclusive[0].matched_candidate, Some(0));
        assert_eq!(exclusive[1].matched_candidate, None);
    }

    #[test]
    fn unmatched_candidates_are_ignored() {
        let expected = vec![det("cup", 10.0, 10.0, 50.0, 50.0, 0.80)];
        let candidates = vec![
            det("person", 100.0, 100.0, 200.0, 300.0, 0.99),
            det("cup", 10.0, 10.0, 50.0, 50.0, 0.80),
        ];
        assert!(all_expectations_matched(&expected, &candidates));
    }
}

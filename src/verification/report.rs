use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::detection::Detection;
use crate::verification::comparator::{ExpectationOutcome, MatchPolicy};
use serde::Serialize;
use std::fmt;

/// Result of checking one image against its golden expectations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub model: String,
    pub policy: MatchPolicy,
    /// Candidates after mapping back into source frame coordinates.
    pub candidates: Vec<Detection<BoundingBox>>,
    pub outcomes: Vec<ExpectationOutcome>,
    pub passed: bool,
}

impl CaseReport {
    pub fn new(
        name: String,
        model: String,
        policy: MatchPolicy,
        candidates: Vec<Detection<BoundingBox>>,
        outcomes: Vec<ExpectationOutcome>,
    ) -> Self {
        let passed = outcomes.iter().all(ExpectationOutcome::is_matched);
        CaseReport {
            name,
            model,
            policy,
            candidates,
            outcomes,
            passed,
        }
    }

    pub fn matched_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_matched()).count()
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}/{} expectations matched ({} candidates, {})",
            if self.passed { "PASS" } else { "FAIL" },
            self.name,
            self.matched_count(),
            self.outcomes.len(),
            self.candidates.len(),
            self.model
        )?;
        for outcome in self.outcomes.iter().filter(|o| !o.is_matched()) {
            write!(f, "\n  missing {}", outcome.expected)?;
            match &outcome.near_miss {
                Some(miss) => write!(
                    f,
                    "; closest #{} {} iou {:.3}, confidence delta {:+.3}, geometry {}, confidence {}",
                    miss.candidate_index,
                    miss.candidate,
                    miss.intersection_over_union,
                    miss.confidence_delta,
                    if miss.criteria.geometry { "ok" } else { "off" },
                    if miss.criteria.confidence { "ok" } else { "off" },
                )?,
                None => write!(f, "; no candidate with this label")?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SuiteReport {
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    /// A suite passes when it has cases and all of them pass.
    pub fn passed(&self) -> bool {
        !self.cases.is_empty() && self.cases.iter().all(|c| c.passed)
    }

    pub fn failed_count(&self) -> usize {
        self.cases.iter().filter(|c| !c.passed).count()
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for case in &self.cases {
            writeln!(f, "{case}")?;
        }
        write!(
            f,
            "{} of {} cases passed",
            self.cases.len() - self.failed_count(),
            self.cases.len()
        )
    }
}

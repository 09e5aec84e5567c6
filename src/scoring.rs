//! Aggregate per-card judgments into a percentage and counts.

use serde::Serialize;

use crate::domain::{Judgment, Score};

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Default)]
pub struct Summary {
  pub percentage: u32,
  pub correct: usize,
  pub unsure: usize,
  pub incorrect: usize,
  pub total: usize,
}

/// correct = 1, unsure = 0.5, incorrect = 0; `round(100 * points / count)`, 0 for no judgments.
///
/// Works in half-points so the rounding is exact: `floor((100h + n) / 2n)` is round-half-up
/// of `100h / 2n`.
pub fn summarize(judgments: &[Judgment]) -> Summary {
  let total = judgments.len();
  let correct = judgments.iter().filter(|j| j.score == Score::Correct).count();
  let unsure = judgments.iter().filter(|j| j.score == Score::Unsure).count();
  let incorrect = total - correct - unsure;

  let percentage = if total == 0 {
    0
  } else {
    let half_points: u64 = judgments.iter().map(|j| j.score.half_points()).sum();
    let n = total as u64;
    ((100 * half_points + n) / (2 * n)) as u32
  };

  Summary { percentage, correct, unsure, incorrect, total }
}

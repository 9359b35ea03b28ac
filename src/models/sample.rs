//! Problem, record, and run summary types.
//!
//! These types carry the data flow of one pipeline run: a `Problem` goes in,
//! `DatasetRecord`s come out, and `RunStats` summarizes what happened.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference problem with a known-correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Unique identifier for this problem
    pub id: String,

    /// The problem statement
    #[serde(rename = "problem", alias = "statement")]
    pub statement: String,

    /// Known-correct final answer
    pub ground_truth_answer: String,
}

impl Problem {
    pub fn new(
        id: impl Into<String>,
        statement: impl Into<String>,
        ground_truth_answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            statement: statement.into(),
            ground_truth_answer: ground_truth_answer.into(),
        }
    }
}

/// Accepted fine-tuning example: a problem and one verified reasoning trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Original problem statement (not the formatted prompt)
    #[serde(rename = "problem")]
    pub problem_statement: String,

    /// Full raw completion text
    #[serde(rename = "reasoning_path")]
    pub reasoning_trace: String,
}

impl DatasetRecord {
    pub fn new(problem_statement: impl Into<String>, reasoning_trace: impl Into<String>) -> Self {
        Self {
            problem_statement: problem_statement.into(),
            reasoning_trace: reasoning_trace.into(),
        }
    }
}

/// How a single pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Samples were drawn and filtered
    Completed,
    /// The problem id was unknown; nothing was sampled or emitted
    ProblemNotFound,
}

/// Statistics for one problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub problem_id: String,

    pub outcome: RunOutcome,

    /// Samples asked of the completion source
    pub requested: usize,

    /// Samples actually returned
    pub generated: usize,

    /// Samples with an extractable answer
    pub extracted: usize,

    /// Samples verified against ground truth and emitted
    pub accepted: usize,

    /// Plurality answer across the samples, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus_answer: Option<String>,

    /// Whether the plurality answer matches ground truth
    pub consensus_correct: bool,

    pub runtime_secs: f64,
}

impl RunStats {
    /// Stats for a run that never started sampling.
    pub fn not_found(problem_id: impl Into<String>, requested: usize) -> Self {
        Self {
            problem_id: problem_id.into(),
            outcome: RunOutcome::ProblemNotFound,
            requested,
            generated: 0,
            extracted: 0,
            accepted: 0,
            consensus_answer: None,
            consensus_correct: false,
            runtime_secs: 0.0,
        }
    }

    /// Fraction of requested samples that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.requested == 0 {
            0.0
        } else {
            self.accepted as f64 / self.requested as f64
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            RunOutcome::ProblemNotFound => write!(f, "{}: problem not found", self.problem_id),
            RunOutcome::Completed => write!(
                f,
                "{}: {} of {} accepted",
                self.problem_id, self.accepted, self.requested
            ),
        }
    }
}

/// Aggregate statistics over several problems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub runs: Vec<RunStats>,
    pub total_requested: usize,
    pub total_generated: usize,
    pub total_accepted: usize,
    pub missing_problems: usize,
    pub runtime_secs: f64,
}

impl BatchStats {
    /// Fold one run into the totals.
    pub fn record(&mut self, run: RunStats) {
        match run.outcome {
            RunOutcome::Completed => {
                self.total_requested += run.requested;
                self.total_generated += run.generated;
                self.total_accepted += run.accepted;
            }
            RunOutcome::ProblemNotFound => self.missing_problems += 1,
        }
        self.runs.push(run);
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.total_requested == 0 {
            0.0
        } else {
            self.total_accepted as f64 / self.total_requested as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_with_dataset_field_names() {
        let record = DatasetRecord::new("What is 2+2?", "2+2=4. The answer is 4.");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"problem":"What is 2+2?","reasoning_path":"2+2=4. The answer is 4."}"#
        );
    }

    #[test]
    fn test_problem_accepts_statement_alias() {
        let a: Problem =
            serde_json::from_str(r#"{"id":"p1","problem":"Q","ground_truth_answer":"1"}"#)
                .unwrap();
        let b: Problem =
            serde_json::from_str(r#"{"id":"p1","statement":"Q","ground_truth_answer":"1"}"#)
                .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.statement, "Q");
    }

    #[test]
    fn test_run_stats_display() {
        let mut stats = RunStats::not_found("math_001", 3);
        assert_eq!(stats.to_string(), "math_001: problem not found");

        stats.outcome = RunOutcome::Completed;
        stats.accepted = 2;
        assert_eq!(stats.to_string(), "math_001: 2 of 3 accepted");
        assert!((stats.acceptance_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_batch_stats_counts_missing_separately() {
        let mut batch = BatchStats::default();
        let mut done = RunStats::not_found("a", 4);
        done.outcome = RunOutcome::Completed;
        done.generated = 4;
        done.accepted = 1;
        batch.record(done);
        batch.record(RunStats::not_found("b", 4));

        assert_eq!(batch.runs.len(), 2);
        assert_eq!(batch.total_requested, 4);
        assert_eq!(batch.total_accepted, 1);
        assert_eq!(batch.missing_problems, 1);
        assert!((batch.acceptance_rate() - 0.25).abs() < f64::EPSILON);
    }
}

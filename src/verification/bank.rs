//! Reference problems with known answers.

use crate::models::{CogsynthError, Problem, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Lookup of reference problems by id.
pub trait ProblemStore {
    fn get(&self, id: &str) -> Option<&Problem>;
}

/// In-memory problem bank, kept in load order.
#[derive(Debug, Clone, Default)]
pub struct ProblemBank {
    problems: Vec<Problem>,
}

impl ProblemBank {
    pub fn new(problems: Vec<Problem>) -> Self {
        Self { problems }
    }

    /// The bundled arithmetic word problems.
    pub fn builtin() -> Self {
        Self::new(vec![
            Problem::new(
                "math_001",
                "A grocery store sold 15 apples on Monday. On Tuesday, it sold twice as many \
                 apples as on Monday. On Wednesday, it sold 5 fewer apples than on Tuesday. \
                 How many apples were sold in total over the three days?",
                "70",
            ),
            Problem::new(
                "math_002",
                "A car travels at 60 km/h for 2 hours, then at 80 km/h for 3 hours. \
                 What is the total distance traveled?",
                "360",
            ),
        ])
    }

    /// Load problems from a JSONL file, one problem per line.
    pub fn from_jsonl(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| CogsynthError::io("opening problems file", e))?;
        let reader = BufReader::new(file);
        let mut problems = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| CogsynthError::io("reading problems file", e))?;
            if line.trim().is_empty() {
                continue;
            }
            let problem: Problem = serde_json::from_str(&line).map_err(|e| {
                CogsynthError::ParseError(format!("Line {}: {}", line_num + 1, e))
            })?;
            problems.push(problem);
        }

        info!(count = problems.len(), path = %path.display(), "Loaded problems");
        Ok(Self::new(problems))
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

impl ProblemStore for ProblemBank {
    fn get(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }
}

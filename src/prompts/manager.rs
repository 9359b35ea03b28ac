//! Chain-of-thought prompt construction.

use serde::{Deserialize, Serialize};

/// Phrase appended to a problem for zero-shot chain-of-thought.
pub const ZERO_SHOT_COT_PHRASE: &str = "Let's think step by step.";

const EXAMPLE_SEPARATOR: &str = "\n\n---\n\n";

/// A solved problem used as a few-shot demonstration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkedExample {
    pub problem: String,
    pub reasoning: String,
    pub answer: String,
}

impl WorkedExample {
    pub fn new(
        problem: impl Into<String>,
        reasoning: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            problem: problem.into(),
            reasoning: reasoning.into(),
            answer: answer.into(),
        }
    }
}

/// Builds prompts that ask the model to reason before answering.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptManager;

impl PromptManager {
    pub fn new() -> Self {
        Self
    }

    pub fn zero_shot_cot(&self, problem: &str) -> String {
        format!("{problem}\n\n{ZERO_SHOT_COT_PHRASE}")
    }

    /// Demonstrations end with "The final answer is X." so the model tends to
    /// finish its own trace the same way.
    pub fn few_shot_cot(&self, problem: &str, examples: &[WorkedExample]) -> String {
        let mut blocks: Vec<String> = examples
            .iter()
            .map(|ex| {
                format!(
                    "Problem: {}\nAnswer: {}\nThe final answer is {}.",
                    ex.problem, ex.reasoning, ex.answer
                )
            })
            .collect();
        blocks.push(format!("Problem: {problem}\nAnswer:"));
        blocks.join(EXAMPLE_SEPARATOR)
    }
}

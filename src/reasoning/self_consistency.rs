//! Self-consistency: sample several reasoning traces, extract each final
//! answer, and keep the plurality answer.

use crate::client::CompletionSource;
use crate::parsing::AnswerExtractor;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answer counts in first-seen order.
///
/// Iteration order is insertion order, which is what makes tie-breaking
/// deterministic: among equally common answers the earliest one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally {
    counts: IndexMap<String, usize>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, answer: impl Into<String>) {
        *self.counts.entry(answer.into()).or_insert(0) += 1;
    }

    pub fn count(&self, answer: &str) -> usize {
        self.counts.get(answer).copied().unwrap_or(0)
    }

    /// Total number of votes cast.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(a, c)| (a.as_str(), *c))
    }

    /// Most common answer; ties go to the first one seen.
    pub fn winner(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (answer, count) in self.iter() {
            if best.is_none_or(|(_, top)| count > top) {
                best = Some((answer, count));
            }
        }
        best
    }
}

impl<S: Into<String>> FromIterator<S> for VoteTally {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tally = Self::new();
        for answer in iter {
            tally.add(answer);
        }
        tally
    }
}

/// Outcome of one self-consistency call.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyResult {
    /// Plurality answer, absent when no sample yielded an answer
    pub answer: Option<String>,
    /// Every raw completion, in the order the source returned them
    pub samples: Vec<String>,
    pub tally: VoteTally,
}

impl ConsistencyResult {
    /// Split into `(winning_answer, raw_samples)`.
    pub fn into_parts(self) -> (Option<String>, Vec<String>) {
        (self.answer, self.samples)
    }

    /// Share of votes that went to the winning answer.
    pub fn agreement(&self) -> f64 {
        let total = self.tally.total();
        match &self.answer {
            Some(answer) if total > 0 => self.tally.count(answer) as f64 / total as f64,
            _ => 0.0,
        }
    }
}

/// Samples a prompt repeatedly and votes on the extracted answers.
pub struct ConsistencyVoter<S: ?Sized> {
    source: Arc<S>,
    extractor: Arc<AnswerExtractor>,
}

impl<S: CompletionSource + ?Sized> ConsistencyVoter<S> {
    pub fn new(source: Arc<S>, extractor: Arc<AnswerExtractor>) -> Self {
        Self { source, extractor }
    }

    pub fn extractor(&self) -> &AnswerExtractor {
        &self.extractor
    }

    /// Draw `n_samples` completions for `prompt` and return the plurality
    /// answer along with every raw completion.
    ///
    /// A failing source is treated as one that returned nothing.
    pub async fn reason(&self, prompt: &str, n_samples: usize) -> ConsistencyResult {
        info!(n_samples, "Generating diverse reasoning paths");

        let samples = match self.source.complete_n(prompt, n_samples).await {
            Ok(samples) => samples,
            Err(e) => {
                warn!(error = %e, "Completion source failed, treating as empty batch");
                Vec::new()
            }
        };

        if samples.is_empty() {
            return ConsistencyResult::default();
        }
        if samples.len() < n_samples {
            warn!(
                requested = n_samples,
                received = samples.len(),
                "Completion source returned fewer samples than requested"
            );
        }

        let mut tally = VoteTally::new();
        for (i, sample) in samples.iter().enumerate() {
            let answer = self.extractor.extract(sample);
            debug!(path = i + 1, answer = answer.as_deref().unwrap_or("N/A"), "Path answer");
            if let Some(answer) = answer {
                tally.add(answer);
            }
        }

        let Some((winner, votes)) = tally.winner() else {
            warn!("Could not extract any valid answers from the paths");
            return ConsistencyResult {
                answer: None,
                samples,
                tally,
            };
        };
        let winner = winner.to_string();

        info!(
            answer = %winner,
            votes,
            voters = tally.total(),
            samples = samples.len(),
            "Most consistent answer"
        );

        ConsistencyResult {
            answer: Some(winner),
            samples,
            tally,
        }
    }
}

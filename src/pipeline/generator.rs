//! Dataset generation pipeline.
//!
//! Pipeline flow:
//! Problem → zero-shot CoT prompt → N sampled traces → extract → verify
//! against ground truth → accepted traces → sink
//!
//! Every trace is checked on its own. The plurality vote is reported but
//! never decides acceptance.

use crate::client::CompletionSource;
use crate::models::{
    BatchStats, CogsynthError, DatasetRecord, Result, RunOutcome, RunStats,
};
use crate::parsing::AnswerExtractor;
use crate::pipeline::DatasetSink;
use crate::prompts::PromptManager;
use crate::reasoning::ConsistencyVoter;
use crate::verification::{ProblemStore, Verifier};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Generates verified reasoning traces for reference problems.
pub struct DatasetFilterPipeline<S: ?Sized, P> {
    voter: ConsistencyVoter<S>,
    problems: P,
    prompts: PromptManager,
    verifier: Verifier,
}

impl<S, P> DatasetFilterPipeline<S, P>
where
    S: CompletionSource + ?Sized,
    P: ProblemStore,
{
    pub fn new(source: Arc<S>, extractor: Arc<AnswerExtractor>, problems: P) -> Self {
        Self {
            voter: ConsistencyVoter::new(source, extractor),
            problems,
            prompts: PromptManager::new(),
            verifier: Verifier::new(),
        }
    }

    pub fn problems(&self) -> &P {
        &self.problems
    }

    /// Sample `n_samples` traces for one problem and append the correct ones
    /// to `sink`.
    ///
    /// An unknown problem id is reported and yields `RunOutcome::ProblemNotFound`
    /// rather than an error. Only sink failures are returned as `Err`.
    pub async fn run(
        &self,
        problem_id: &str,
        n_samples: usize,
        sink: &mut dyn DatasetSink,
    ) -> Result<RunStats> {
        let Some(problem) = self.problems.get(problem_id) else {
            error!(problem_id, "Problem not found");
            return Ok(RunStats::not_found(problem_id, n_samples));
        };

        let start = Instant::now();
        info!(
            problem_id,
            ground_truth = %problem.ground_truth_answer,
            n_samples,
            "Generating dataset for problem"
        );

        let prompt = self.prompts.zero_shot_cot(&problem.statement);
        let consensus = self.voter.reason(&prompt, n_samples).await;

        let mut extracted = 0;
        let mut accepted = 0;
        for (i, trace) in consensus.samples.iter().enumerate() {
            let answer = self.voter.extractor().extract(trace);
            if answer.is_some() {
                extracted += 1;
            }

            if self
                .verifier
                .verify(answer.as_deref(), &problem.ground_truth_answer)
            {
                accepted += 1;
                sink.append(&DatasetRecord::new(problem.statement.as_str(), trace.as_str()))?;
            } else {
                debug!(
                    path = i + 1,
                    answer = answer.as_deref().unwrap_or("N/A"),
                    "Path rejected"
                );
            }
        }
        sink.flush()?;

        let consensus_correct = self
            .verifier
            .verify(consensus.answer.as_deref(), &problem.ground_truth_answer);

        let stats = RunStats {
            problem_id: problem.id.clone(),
            outcome: RunOutcome::Completed,
            requested: n_samples,
            generated: consensus.samples.len(),
            extracted,
            accepted,
            consensus_answer: consensus.answer,
            consensus_correct,
            runtime_secs: start.elapsed().as_secs_f64(),
        };

        info!(
            problem_id,
            accepted = stats.accepted,
            requested = stats.requested,
            generated = stats.generated,
            consensus_correct,
            "Found {}/{} correct reasoning paths",
            stats.accepted,
            stats.requested
        );

        Ok(stats)
    }

    /// Run several problems one after another.
    pub async fn run_batch(
        &self,
        problem_ids: &[String],
        n_samples: usize,
        sink: &mut dyn DatasetSink,
    ) -> Result<BatchStats> {
        let start = Instant::now();

        let pb = ProgressBar::new(problem_ids.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
                .map_err(|e| CogsynthError::Internal(format!("Bad progress template: {e}")))?
                .progress_chars("##-"),
        );

        let mut batch = BatchStats::default();
        for problem_id in problem_ids {
            let stats = self.run(problem_id, n_samples, sink).await?;
            batch.record(stats);

            pb.inc(1);
            pb.set_message(format!(
                "accepted: {}/{}",
                batch.total_accepted, batch.total_requested
            ));
        }

        pb.finish_with_message(format!(
            "Done! {} accepted, {} missing problems",
            batch.total_accepted, batch.missing_problems
        ));
        batch.runtime_secs = start.elapsed().as_secs_f64();

        info!(
            problems = problem_ids.len(),
            accepted = batch.total_accepted,
            requested = batch.total_requested,
            missing = batch.missing_problems,
            acceptance_rate = format!("{:.1}%", batch.acceptance_rate() * 100.0),
            "Dataset generation complete"
        );

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::ScriptedSource;
    use crate::models::{ExtractionConfig, Problem};
    use crate::pipeline::{JsonlSink, MemorySink};
    use crate::verification::ProblemBank;
    use tempfile::TempDir;

    fn pipeline(source: ScriptedSource) -> DatasetFilterPipeline<ScriptedSource, ProblemBank> {
        let extractor = Arc::new(AnswerExtractor::new(&ExtractionConfig::default()).unwrap());
        DatasetFilterPipeline::new(Arc::new(source), extractor, ProblemBank::builtin())
    }

    const APPLE_TRACES: [&str; 3] = [
        "Monday 15, Tuesday 30, Wednesday 25. The final answer is 70.",
        "15 + 30 + 20 = 65 apples.",
        "Adding up all three days gives 70.0 apples.",
    ];

    #[tokio::test]
    async fn test_emits_only_verified_traces() {
        let pipeline = pipeline(ScriptedSource::new(&APPLE_TRACES));
        let mut sink = MemorySink::new();

        let stats = pipeline.run("math_001", 3, &mut sink).await.unwrap();

        assert_eq!(stats.outcome, RunOutcome::Completed);
        assert_eq!(stats.generated, 3);
        assert_eq!(stats.extracted, 3);
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.to_string(), "math_001: 2 of 3 accepted");

        let statement = &pipeline.problems().get("math_001").unwrap().statement;
        assert_eq!(sink.records.len(), 2);
        assert_eq!(sink.records[0].problem_statement, *statement);
        assert_eq!(sink.records[0].reasoning_trace, APPLE_TRACES[0]);
        assert_eq!(sink.records[1].reasoning_trace, APPLE_TRACES[2]);
    }

    #[tokio::test]
    async fn test_prompt_is_zero_shot_cot() {
        let source = Arc::new(ScriptedSource::new(&APPLE_TRACES));
        let extractor = Arc::new(AnswerExtractor::new(&ExtractionConfig::default()).unwrap());
        let bank = ProblemBank::new(vec![Problem::new("p", "What is 1+1?", "2")]);
        let pipeline = DatasetFilterPipeline::new(Arc::clone(&source), extractor, bank);

        pipeline.run("p", 3, &mut MemorySink::new()).await.unwrap();

        let prompts = source.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].0, "What is 1+1?\n\nLet's think step by step.");
        assert_eq!(prompts[0].1, 3);
    }

    #[tokio::test]
    async fn test_consensus_is_reported_but_not_used_for_acceptance() {
        let pipeline = pipeline(ScriptedSource::new(&[
            "The answer is 65.",
            "The answer is 65.",
            "The answer is 70.",
        ]));
        let mut sink = MemorySink::new();

        let stats = pipeline.run("math_001", 3, &mut sink).await.unwrap();

        assert_eq!(stats.consensus_answer.as_deref(), Some("65"));
        assert!(!stats.consensus_correct);
        assert_eq!(stats.accepted, 1);
        assert_eq!(sink.records[0].reasoning_trace, "The answer is 70.");
    }

    #[tokio::test]
    async fn test_duplicate_traces_are_kept() {
        let pipeline = pipeline(ScriptedSource::new(&["The answer is 360.", "The answer is 360."]));
        let mut sink = MemorySink::new();

        let stats = pipeline.run("math_002", 2, &mut sink).await.unwrap();
        assert_eq!(stats.accepted, 2);
        assert_eq!(sink.records[0], sink.records[1]);
    }

    #[tokio::test]
    async fn test_short_batch_is_processed() {
        let pipeline = pipeline(ScriptedSource::new(&[
            "The answer is 70.",
            "The total is -70.",
        ]));
        let mut sink = MemorySink::new();

        let stats = pipeline.run("math_001", 5, &mut sink).await.unwrap();

        assert_eq!(stats.outcome, RunOutcome::Completed);
        assert_eq!(stats.requested, 5);
        assert_eq!(stats.generated, 2);
        assert_eq!(stats.extracted, 2);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.to_string(), "math_001: 1 of 5 accepted");
        assert_eq!(sink.records.len(), 1);
        assert_eq!(sink.records[0].reasoning_trace, "The answer is 70.");
    }

    #[tokio::test]
    async fn test_empty_batch_emits_nothing() {
        let pipeline = pipeline(ScriptedSource::new(&[]));
        let mut sink = MemorySink::new();

        let stats = pipeline.run("math_001", 5, &mut sink).await.unwrap();
        assert_eq!(stats.outcome, RunOutcome::Completed);
        assert_eq!(stats.generated, 0);
        assert_eq!(stats.accepted, 0);
        assert!(sink.records.is_empty());
    }

    #[tokio::test]
    async fn test_failing_source_emits_nothing() {
        let pipeline = pipeline(ScriptedSource::failing());
        let mut sink = MemorySink::new();

        let stats = pipeline.run("math_001", 5, &mut sink).await.unwrap();
        assert_eq!(stats.generated, 0);
        assert!(sink.records.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_problem_is_reported_not_raised() {
        let source = Arc::new(ScriptedSource::new(&APPLE_TRACES));
        let extractor = Arc::new(AnswerExtractor::new(&ExtractionConfig::default()).unwrap());
        let pipeline =
            DatasetFilterPipeline::new(Arc::clone(&source), extractor, ProblemBank::builtin());
        let mut sink = MemorySink::new();

        let stats = pipeline.run("math_404", 3, &mut sink).await.unwrap();

        assert_eq!(stats.outcome, RunOutcome::ProblemNotFound);
        assert!(sink.records.is_empty());
        assert!(source.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_batch_writes_jsonl() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dataset.jsonl");
        let pipeline = pipeline(ScriptedSource::new(&APPLE_TRACES));
        let mut sink = JsonlSink::open(&path).unwrap();

        let ids = vec!["math_001".to_string(), "nope".to_string()];
        let batch = pipeline.run_batch(&ids, 3, &mut sink).await.unwrap();

        assert_eq!(batch.runs.len(), 2);
        assert_eq!(batch.total_accepted, 2);
        assert_eq!(batch.missing_problems, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        for line in content.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value["problem"].as_str().unwrap().starts_with("A grocery store"));
            assert!(value["reasoning_path"].is_string());
        }
    }
}

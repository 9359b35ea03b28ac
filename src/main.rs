//! cogsynth CLI - verified chain-of-thought dataset generation.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cogsynth::{
    AnswerExtractor, Config, ConsistencyVoter, DatasetFilterPipeline, JsonlSink, LLMClient,
    ProblemBank, RunOutcome,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "cogsynth")]
#[command(version)]
#[command(about = "Self-consistency sampling and ground-truth filtering of reasoning traces")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "cogsynth.toml")]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample reasoning traces for problems and keep the verified ones
    Generate {
        /// Problem ids to process, in order
        #[arg(short = 'i', long = "problem", required = true, num_args = 1..)]
        problem_ids: Vec<String>,

        /// Samples per problem (overrides config)
        #[arg(short, long)]
        samples: Option<usize>,

        /// Output JSONL file, appended to (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Problems JSONL file (overrides config; default is the built-in bank)
        #[arg(short, long)]
        problems: Option<PathBuf>,
    },

    /// Self-consistency answer for an arbitrary prompt
    Reason {
        #[arg(short, long)]
        prompt: String,

        /// Samples to draw (overrides config)
        #[arg(short, long)]
        samples: Option<usize>,
    },

    /// Single deterministic completion and its extracted answer
    Ask {
        #[arg(short, long)]
        prompt: String,
    },

    /// List the problem bank
    Problems {
        /// Problems JSONL file (overrides config)
        #[arg(short, long)]
        problems: Option<PathBuf>,
    },

    /// Validate configuration file
    Validate,

    /// Show example configuration
    Example,
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

fn print_example_config() {
    let example = r#"# cogsynth configuration file

[endpoint]
base_url = "https://api.openai.com/v1"
# API key (can also use the env var named by api_key_env)
# api_key = "${OPENAI_API_KEY}"
api_key_env = "OPENAI_API_KEY"
timeout_secs = 180

[model]
id = "gpt-4o-mini"
temperature = 0.7     # > 0 so that samples differ
max_tokens = 1024
system_prompt = "You are a helpful assistant."

[generation]
samples = 8
# problems = "problems.jsonl"   # {"id", "problem", "ground_truth_answer"} per line

[extraction]
markers = ["the final answer is", "the answer is", "the output is"]
max_trailing_words = 2

[output]
path = "output/dataset.jsonl"
"#;
    println!("{example}");
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load_or_default(path).with_context(|| format!("Failed to load config from {path:?}"))
}

fn load_bank(path: Option<&Path>) -> Result<ProblemBank> {
    match path {
        Some(path) => ProblemBank::from_jsonl(path)
            .with_context(|| format!("Failed to load problems from {path:?}")),
        None => Ok(ProblemBank::builtin()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Example => print_example_config(),

        Commands::Validate => {
            let config = Config::from_file(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
            config.validate().context("Invalid configuration")?;
            config
                .resolve_api_key()
                .context("Failed to resolve API key")?;
            AnswerExtractor::new(&config.extraction).context("Invalid extraction rules")?;

            info!("Configuration is valid");
            info!("  Endpoint: {}", config.endpoint.base_url);
            info!(
                "  Model: {} (temperature {})",
                config.model.id, config.model.temperature
            );
            info!("  Samples per problem: {}", config.generation.samples);
            info!(
                "  Extraction: {} markers, up to {} trailing words",
                config.extraction.markers.len(),
                config.extraction.max_trailing_words
            );
        }

        Commands::Problems { problems } => {
            let config = load_config(&cli.config)?;
            let bank = load_bank(problems.as_deref().or(config.generation.problems.as_deref()))?;
            for problem in bank.problems() {
                println!(
                    "{}\t{}\t{}",
                    problem.id, problem.ground_truth_answer, problem.statement
                );
            }
        }

        Commands::Ask { prompt } => {
            let config = load_config(&cli.config)?;
            let client = LLMClient::from_config(&config).context("Failed to create client")?;
            let extractor = AnswerExtractor::new(&config.extraction)?;

            let response = client.query(&prompt).await.context("Query failed")?;
            println!("{response}");
            println!(
                "\nExtracted answer: {}",
                extractor.extract(&response).as_deref().unwrap_or("N/A")
            );
        }

        Commands::Reason { prompt, samples } => {
            let mut config = load_config(&cli.config)?;
            if let Some(samples) = samples {
                config.generation.samples = samples;
            }
            config.validate().context("Invalid configuration")?;

            let client =
                Arc::new(LLMClient::from_config(&config).context("Failed to create client")?);
            let extractor = Arc::new(AnswerExtractor::new(&config.extraction)?);
            let voter = ConsistencyVoter::new(client, extractor);

            let result = voter.reason(&prompt, config.generation.samples).await;

            println!("\n=== Self-Consistency ===");
            println!("Samples:     {}", result.samples.len());
            for (answer, count) in result.tally.iter() {
                println!("  {count:>3}  {answer}");
            }
            match &result.answer {
                Some(answer) => println!(
                    "Answer:      {answer} ({:.0}% agreement)",
                    result.agreement() * 100.0
                ),
                None => println!("Answer:      N/A"),
            }
        }

        Commands::Generate {
            problem_ids,
            samples,
            output,
            problems,
        } => {
            let mut config = load_config(&cli.config)?;
            if let Some(samples) = samples {
                config.generation.samples = samples;
            }
            if let Some(output) = output {
                config.output.path = output;
            }
            if problems.is_some() {
                config.generation.problems = problems;
            }
            config.validate().context("Invalid configuration")?;

            let bank = load_bank(config.generation.problems.as_deref())?;
            if bank.is_empty() {
                bail!("Problem bank is empty");
            }

            let client =
                Arc::new(LLMClient::from_config(&config).context("Failed to create client")?);
            let extractor = Arc::new(AnswerExtractor::new(&config.extraction)?);
            let pipeline = DatasetFilterPipeline::new(Arc::clone(&client), extractor, bank);

            let mut sink = JsonlSink::open(&config.output.path)
                .with_context(|| format!("Failed to open output {:?}", config.output.path))?;

            let batch = pipeline
                .run_batch(&problem_ids, config.generation.samples, &mut sink)
                .await?;

            println!("\n=== Dataset Generation Complete ===");
            for run in &batch.runs {
                match run.outcome {
                    RunOutcome::Completed => println!(
                        "{run} (consensus: {}{})",
                        run.consensus_answer.as_deref().unwrap_or("N/A"),
                        if run.consensus_correct { ", correct" } else { "" }
                    ),
                    RunOutcome::ProblemNotFound => println!("{run}"),
                }
            }
            let (tokens_in, tokens_out) = client.total_tokens();
            println!("Accepted:    {}/{}", batch.total_accepted, batch.total_requested);
            println!("Acceptance:  {:.1}%", batch.acceptance_rate() * 100.0);
            println!("Missing:     {}", batch.missing_problems);
            println!("Tokens:      {tokens_in} in / {tokens_out} out");
            println!("Runtime:     {:.1}s", batch.runtime_secs);
            println!("Output:      {:?}", sink.path());
        }
    }

    Ok(())
}

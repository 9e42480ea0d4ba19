mod adapters;
mod config;
mod core;

use adapters::llm::LLMAdapter;
use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "prscope")]
#[command(about = "Review a GitHub pull request with a language model, chunk by chunk", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(help = "Pull request URL, e.g. https://github.com/<owner>/<repo>/pull/<number>")]
    pr_link: String,

    #[arg(long, help = "Model used for review (default: gpt-4)")]
    model: Option<String>,

    #[arg(long = "max-chars", help = "Maximum characters per reviewed chunk")]
    max_chars: Option<usize>,

    #[arg(
        long,
        value_name = "EXT",
        help = "Extension to skip; repeat to build the set (replaces the configured one)"
    )]
    exclude: Vec<String>,

    #[arg(long, default_value = config::DEFAULT_ENV_FILE, help = "Env file holding credentials")]
    env_file: PathBuf,

    #[arg(long, help = "YAML config file (defaults to ./.prscope.yml or ~/.prscope.yml)")]
    config: Option<PathBuf>,

    #[arg(
        short,
        long,
        help = "Output file path (prints to stdout if not provided)"
    )]
    output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            let _ = err.print();
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("info,prscope=debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = config::Config::resolve(cli.config.as_deref(), &cli.env_file)?;
    config.merge_with_cli(cli.model, cli.max_chars, cli.exclude);
    config.validate()?;

    let mut pr = core::PrLink::parse(&cli.pr_link)?;
    if let Some(api_url) = &config.github_api_url {
        pr = pr.with_api_base(api_url.clone());
    }

    let adapter = adapters::OpenAIAdapter::new(config.model_config())?;
    let github = adapters::GitHubClient::new(config.github_token.clone(), config.timeout_secs)?;

    match review_pull_request(&config, &pr, &github, &adapter).await? {
        Some(feedback) => output_feedback(&feedback, cli.output).await?,
        None => info!("No reviewable changes in {} after filtering", pr),
    }

    Ok(())
}

/// Fetch, filter, chunk and review one pull request.
///
/// Returns `None` when nothing is left to review after filtering. A fetch
/// failure is returned as an error before any model call is made.
async fn review_pull_request(
    config: &config::Config,
    pr: &core::PrLink,
    github: &adapters::GitHubClient,
    adapter: &dyn LLMAdapter,
) -> Result<Option<String>> {
    let raw_diff = github.fetch_pr_diff(pr).await?;

    info!("Processing diff code...");
    let diff = core::DiffParser::parse(&raw_diff);
    let binary = diff.files.iter().filter(|file| file.is_binary).count();
    info!("Parsed {} file diffs ({} binary)", diff.files.len(), binary);

    let exclusions = config.exclusion_set();
    debug!("Excluding extensions: {}", exclusions.extensions().join(", "));
    let filtered = exclusions.filter(&diff);
    let chunker = core::DiffChunker::new(config.max_chunk_chars);
    let chunks = chunker.chunk_lines(filtered.lines());
    if chunks.is_empty() {
        return Ok(None);
    }

    info!(
        "Reviewing code diff: {} files in {} chunk(s) of at most {} chars",
        filtered.files.len(),
        chunks.len(),
        chunker.max_chars()
    );
    let reviewer = core::ChunkedReviewer::new(adapter, config.prompt_builder());
    Ok(Some(reviewer.review(&chunks).await))
}

async fn output_feedback(feedback: &str, output_path: Option<PathBuf>) -> Result<()> {
    if let Some(path) = output_path {
        tokio::fs::write(&path, feedback).await?;
        info!("Feedback written to {}", path.display());
    } else {
        println!("{}", feedback);
    }
    Ok(())
}

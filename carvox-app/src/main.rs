use anyhow::Result;
use carvox_app::{conclude, run_pipeline};
use carvox_common::observability::{LogConfig, init_logging};
use carvox_common::{CarQuery, OutputFormat};
use carvox_config::{CarvoxConfig, CarvoxConfigLoader};
use carvox_llm::traits::LlmClient;
use carvox_runtime::CarvoxRuntime;
use carvox_social::RedditApi;
use carvox_web::BingApi;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

const LOCAL_CONFIG: &str = "carvox.yaml";

/// Collect forum posts and web search snippets about a car model and print an
/// LLM-written summary of them.
#[derive(Debug, Parser)]
#[command(name = "carvox", version, about)]
struct Args {
    /// Car model to research, e.g. "Tesla Model 3".
    query: String,

    /// YAML file layered over the built-in defaults.
    #[arg(long, env = "CARVOX_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured language model.
    #[arg(long)]
    model: Option<String>,

    /// Console rendering.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = init_logging(LogConfig::default()) {
        eprintln!("carvox: file logging disabled: {err:#}");
    }

    conclude(run(args), &mut std::io::stdout().lock())
}

fn load_config(args: &Args) -> Result<CarvoxConfig> {
    let loader = match &args.config {
        Some(path) => CarvoxConfigLoader::new().with_file(path),
        None => CarvoxConfigLoader::new().with_optional_file(LOCAL_CONFIG),
    };
    let mut cfg = loader.load()?;
    if let Some(model) = &args.model {
        cfg.llm.set_model(model.as_str());
    }
    Ok(cfg)
}

fn run(args: Args) -> Result<()> {
    let cfg = load_config(&args)?;
    let timeout = cfg.http.timeout();

    let reddit = RedditApi::new(&cfg.reddit, timeout)?;
    let bing = BingApi::new(&cfg.bing, timeout)?;
    let llm = carvox_llm::client_from_config(&cfg.llm, timeout)?;
    tracing::info!(
        subreddit = %cfg.reddit.subreddit,
        model = llm.model_name(),
        "clients ready"
    );

    let query = CarQuery::new(args.query.trim());
    let format = OutputFormat::from(args.format);

    let runtime = CarvoxRuntime::build("carvox")?;
    let result = runtime.block_on(async {
        let mut stdout = std::io::stdout().lock();
        run_pipeline(&query, &reddit, &bing, llm.as_ref(), format, &mut stdout).await
    });
    runtime.shutdown(Duration::from_millis(100));

    let report = result?;
    tracing::info!(
        query = %report.query,
        total = report.total_reviews(),
        summary_lines = report.summary.len(),
        "lookup complete"
    );
    Ok(())
}

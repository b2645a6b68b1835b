//! deep-research CLI
//!
//! Command-line entrypoint: loads configuration from the environment,
//! assembles the provider and tool registry, runs one research query and
//! prints the summary with its sources.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use research_core::agent::DEFAULT_MAX_ITERATIONS;
use research_core::ResearchAgent;
use research_runtime::{build_registry, LlmConfig};

#[derive(Parser)]
#[command(name = "research", about = "Run a deep-research query against the configured LLM provider")]
struct Cli {
    /// The research query to answer
    query: Vec<String>,

    /// Maximum reasoning iterations before the run is force-finished
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: u32,

    /// Print the result as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let query = cli.query.join(" ");

    let config = LlmConfig::from_env()?;
    let provider = config.build_provider()?;
    let tools = Arc::new(build_registry(&config, provider.clone())?);

    tracing::info!(
        provider = provider.name(),
        tools = tools.len(),
        max_iterations = cli.max_iterations,
        "research agent ready"
    );

    let agent = ResearchAgent::new(provider, tools).with_max_iterations(cli.max_iterations);
    let answer = agent.run(&query).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{}", answer.summary);
        if !answer.sources.is_empty() {
            println!("\nSources:");
            for source in &answer.sources {
                println!("  [{}] {} - {}", source.source_name, source.title, source.url);
            }
        }
    }

    Ok(())
}

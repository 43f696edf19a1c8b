//! Travel recommendations with Mem0-backed memory.
//!
//! Seeds the user's travel preferences into Mem0, then runs a one-agent
//! crew that recommends places to visit, eat and stay at a destination.
//!
//! # Environment Variables
//!
//! - `MEM0_API_KEY` - Mem0 platform key
//! - `OPENAI_API_KEY` - OpenAI key for the agent's model
//! - `SERPER_API_KEY` - Serper key for the web search tool
//! - `RUST_LOG` - Tracing filter (default: "info,crewai_mem0=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin mem0-poc -- "Lisbon, Portugal" --user-id traveler_42
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crewai_mem0::{RecommendationPoc, Settings};

#[derive(Debug, Parser)]
#[command(name = "mem0-poc", version, about = "Personalized travel recommendations backed by Mem0")]
struct Args {
    /// Destination to recommend for (default: Kyoto, Japan)
    destination: Option<String>,

    /// YAML settings file
    #[arg(long, short, env = "MEM0_POC_CONFIG")]
    config: Option<PathBuf>,

    /// Memory namespace to seed and read
    #[arg(long)]
    user_id: Option<String>,

    /// Suppress agent and crew progress output
    #[arg(long, short)]
    quiet: bool,
}

impl Args {
    /// Settings from `--config` (or the environment) with the flags applied.
    fn settings(&self) -> anyhow::Result<Settings> {
        let base = match self.config {
            Some(ref path) => Settings::from_yaml_file(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?,
            None => Settings::from_env(),
        };
        Ok(self.apply(base))
    }

    /// Command-line values win over loaded settings.
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(ref destination) = self.destination {
            settings.destination = destination.clone();
        }
        if let Some(ref user_id) = self.user_id {
            settings.user_id = user_id.clone();
        }
        if self.quiet {
            settings.verbose = false;
        }
        settings
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,crewai_mem0=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = args.settings()?;
    tracing::info!(
        user_id = %settings.user_id,
        destination = %settings.destination,
        model = %settings.llm,
        "starting recommendation run"
    );

    let destination = settings.destination.clone();
    let poc = RecommendationPoc::new(settings).context("failed to set up the Mem0 client")?;
    let output = poc.run(&destination).await.context("recommendation run failed")?;

    match output {
        Some(output) => tracing::info!(
            total_tokens = output.token_usage.total_tokens,
            "recommendations generated"
        ),
        None => tracing::warn!("crew failed; no recommendations produced"),
    }
    Ok(())
}

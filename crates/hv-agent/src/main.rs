//! HearthVoice agent: turns spoken-command text into Home Assistant actions.
//!
//! `hv-agent [config] [utterance...]`: with an utterance, runs one turn and
//! prints the reply. Otherwise reads one utterance per stdin line until EOF
//! or Ctrl-C.

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use hv_agent::config::AgentConfig;
use hv_agent::pipeline::VoicePipeline;

const DEFAULT_CONFIG_PATH: &str = "/etc/hearthvoice/agent.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hv-agent starting");

    // ── Load config ─────────────────────────────────────────────
    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let utterance = args.collect::<Vec<_>>().join(" ");

    let config = AgentConfig::from_file(&config_path)?;
    tracing::info!(
        backend = %config.backend.base_url,
        model = %config.llm.model,
        include_climate = config.backend.include_climate,
        "config loaded"
    );

    let language = std::env::var("HEARTHVOICE_LANGUAGE").unwrap_or_else(|_| "en".to_string());
    let pipeline = VoicePipeline::from_config(&config)?;

    // ── One-shot ────────────────────────────────────────────────
    if !utterance.trim().is_empty() {
        println!("{}", pipeline.process(&utterance, &language, None).await);
        return Ok(());
    }

    // ── Interactive: one utterance per line ─────────────────────
    tracing::info!("hv-agent ready, reading utterances from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                println!("{}", pipeline.process(line, &language, None).await);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    tracing::info!("hv-agent stopped");
    Ok(())
}

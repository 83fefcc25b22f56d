//! `conclave run` — Put one prompt to a society of agents.

use std::sync::Arc;
use std::time::Instant;

use conclave_config::{AppConfig, CapabilityKind};
use conclave_core::{CancellationToken, Capability, Mode};
use conclave_engine::{EngineTimeouts, Society, SocietyConfig};
use conclave_providers::CapabilityRegistry;
use tracing::debug;

/// Used when `--prompt` is omitted.
pub const DEFAULT_PROMPT: &str = "How do I build a simple RESTful API in Rust?";

pub struct RunArgs {
    pub mode: Option<Mode>,
    pub agents: Option<usize>,
    pub single_capability: bool,
    pub prompt: Option<String>,
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let missing_keys: Vec<&str> = config
        .capabilities
        .iter()
        .filter(|c| c.kind == CapabilityKind::OpenAiCompat && c.api_key.is_none())
        .map(|c| c.name.as_str())
        .collect();
    if !missing_keys.is_empty() {
        eprintln!();
        eprintln!("  ERROR: No API key for: {}", missing_keys.join(", "));
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    CONCLAVE_API_KEY = 'sk-...'   (generic)");
        eprintln!("    OPENAI_API_KEY   = 'sk-...'   (for OpenAI direct)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        eprintln!(
            "  For offline runs declare `kind = \"echo\"` or `kind = \"scripted\"` capabilities."
        );
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let run_config = society_config(&config, &args);
    let registry = CapabilityRegistry::from_config(&config);
    let (capabilities, synthesis) = split_capabilities(&registry, &config, run_config.mode);
    let pool_names = capability_names(&capabilities);
    debug!(
        pool = capabilities.len(),
        synthesis = synthesis.as_ref().map(|s| s.name()).unwrap_or("none"),
        "Capabilities resolved"
    );

    let synthesis_name = synthesis.as_ref().map(|s| s.name().to_string());
    let cancel = CancellationToken::new();
    let society = Society::new(capabilities)
        .with_synthesis(synthesis)
        .with_timeouts(EngineTimeouts::from(&config.timeouts))
        .with_cancellation(cancel.clone());

    // Ctrl+C cancels in-flight capability calls instead of killing the process.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n  Interrupted, cancelling agents...");
            cancel.cancel();
        }
    });

    println!();
    println!("  Mode:         {}", run_config.mode);
    println!("  Agents:       {}", run_config.agent_count);
    println!("  Capabilities: {}", pool_names.join(", "));
    if let Some(judge) = &synthesis_name {
        println!("  Synthesis:    {judge}");
    }
    println!("  Prompt:       {}", run_config.prompt);
    println!();

    let started = Instant::now();
    let result = society.run(&run_config).await?;
    let elapsed = started.elapsed();

    let rule = "─".repeat(60);
    println!("{rule}");
    println!("{result}");
    println!("{rule}");
    println!("  Completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

/// Merge CLI flags over the loaded configuration.
fn society_config(config: &AppConfig, args: &RunArgs) -> SocietyConfig {
    let prompt = args
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROMPT);

    SocietyConfig::new(prompt, args.agents.unwrap_or(config.agent_count))
        .multi_capability(config.multi_capability && !args.single_capability)
        .mode(args.mode.unwrap_or(config.mode))
}

/// Names of the capabilities agents are bound to, in binding order.
fn capability_names(pool: &[Arc<dyn Capability>]) -> Vec<String> {
    pool.iter().map(|c| c.name().to_string()).collect()
}

/// Pool capabilities and the synthesis capability.
///
/// A declared `synthesis_capability` is kept out of the pool. Without one,
/// synthesis mode falls back to the first declared capability.
fn split_capabilities(
    registry: &CapabilityRegistry,
    config: &AppConfig,
    mode: Mode,
) -> (Vec<Arc<dyn Capability>>, Option<Arc<dyn Capability>>) {
    match config.synthesis_capability.as_deref() {
        Some(name) => (registry.all_except(Some(name)), registry.get(name)),
        None => {
            let pool = registry.all();
            let synthesis = match mode {
                Mode::Synthesis => pool.first().cloned(),
                _ => None,
            };
            (pool, synthesis)
        }
    }
}

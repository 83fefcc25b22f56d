//! `conclave capabilities` — List the configured capabilities.

use conclave_config::{AppConfig, CapabilityConfig, CapabilityKind};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Configured capabilities (pool assignment order)");
    println!("===============================================");
    println!();
    for cap in &config.capabilities {
        let marker = if config.synthesis_capability.as_deref() == Some(cap.name.as_str()) {
            " (synthesis)"
        } else {
            ""
        };
        println!("  {:<16} {}{marker}", cap.name, describe(cap));
    }
    println!();
    println!(
        "  Synthesis capability: {}",
        config
            .synthesis_capability
            .as_deref()
            .unwrap_or("none (synthesis mode uses the first capability)")
    );
    println!(
        "  Defaults: {} agents, mode {}, multi-capability {}",
        config.agent_count, config.mode, config.multi_capability
    );

    Ok(())
}

fn describe(cap: &CapabilityConfig) -> String {
    match cap.kind {
        CapabilityKind::OpenAiCompat => format!(
            "openai_compat  {} @ {}  key: {}",
            cap.model.as_deref().unwrap_or("gpt-4o-mini"),
            cap.base_url.as_deref().unwrap_or("https://api.openai.com/v1"),
            if cap.api_key.is_some() { "set" } else { "missing" },
        ),
        CapabilityKind::Echo => "echo".to_string(),
        CapabilityKind::Scripted => format!(
            "scripted       {} responses, delay {}-{}ms",
            cap.responses.len(),
            cap.min_delay_ms,
            cap.max_delay_ms
        ),
    }
}

//! `ironquill status` — Show configuration and endpoint health.

use anyhow::Context;
use ironquill_config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    println!("Ironquill Status");
    println!("================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", ironquill_providers::select::model_for(&config));
    println!("  Temperature:  {}", config.default_temperature);
    println!("  History:      {}", if config.use_history { "on" } else { "off" });
    println!("  Tool rounds:  {}", config.max_tool_rounds);
    println!("  Tools:        {}", config.tools.mode);
    println!(
        "  Summarize:    {} (threshold {})",
        if config.summarize.enabled { "on" } else { "off" },
        config.summarize.threshold
    );
    println!(
        "  Persistence:  {}",
        if config.persistence.enabled { "on" } else { "off" }
    );
    println!(
        "  API key:      {}",
        if config.has_api_key() { "configured" } else { "missing" }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("\n  No config file — run `ironquill onboard` first");
    }

    // Reachability check against the configured endpoint.
    let endpoint = ironquill_providers::build_endpoint(&config);
    match endpoint.health_check().await {
        Ok(true) => println!("\n  Endpoint reachable"),
        Ok(false) => println!("\n  Endpoint responded with an error status"),
        Err(e) => println!("\n  Endpoint unreachable: {e}"),
    }

    Ok(())
}

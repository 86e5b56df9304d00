//! `ironquill chat` — Interactive or single-message chat mode.

use anyhow::Context;
use ironquill_chat::{ConversationManager, Summarizer, SummarizerConfig, ToolOrchestrator};
use ironquill_config::AppConfig;
use ironquill_core::ToolService;
use ironquill_persist::FileStore;
use ironquill_toolsvc::HttpToolService;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

pub async fn run(message: Option<String>, fresh: bool) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    // A missing API key gives a confusing HTTP 401 later — catch it early.
    // Ollama runs locally and doesn't need one.
    if !config.has_api_key()
        && config.default_provider != "ollama"
        && !config.providers.contains_key(&config.default_provider)
    {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENROUTER_API_KEY   (recommended)");
        eprintln!("    OPENAI_API_KEY");
        eprintln!("    IRONQUILL_API_KEY");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        anyhow::bail!("No API key found. See above for setup instructions.");
    }

    let endpoint = ironquill_providers::build_endpoint(&config);
    let model = ironquill_providers::select::model_for(&config);

    // Tool service per config; "none" leaves the conversation tool-free.
    let tool_service: Option<Arc<dyn ToolService>> = match config.tools.mode.as_str() {
        "local" => Some(Arc::new(
            ironquill_toolsvc::default_service()
                .with_call_timeout(Duration::from_secs(config.tools.call_timeout_secs)),
        )),
        "http" => config.tools.http_url.as_ref().map(|url| {
            Arc::new(HttpToolService::new(url, config.tools.call_timeout_secs))
                as Arc<dyn ToolService>
        }),
        _ => None,
    };

    let mut orchestrator = ToolOrchestrator::new(endpoint.clone(), &model)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
        .with_max_rounds(config.max_tool_rounds);
    if let Some(service) = tool_service.clone() {
        orchestrator = orchestrator.with_tool_service(service);
    }

    let mut manager =
        ConversationManager::new(orchestrator, &config.system_prompt, config.use_history);

    if config.summarize.enabled {
        let mut summarizer_config = SummarizerConfig::new(
            config
                .summarize
                .model
                .clone()
                .unwrap_or_else(|| model.clone()),
        )
        .with_threshold(config.summarize.threshold);
        summarizer_config.max_tokens = Some(config.summarize.max_tokens);
        summarizer_config.temperature = config.summarize.temperature;
        if let Some(prompt) = &config.summarize.prompt {
            summarizer_config.system_prompt = prompt.clone();
        }
        if let Some(instruction) = &config.summarize.instruction {
            summarizer_config.instruction = instruction.clone();
        }
        manager = manager.with_summarizer(Summarizer::new(endpoint.clone(), summarizer_config));
    }

    if config.persistence.enabled && config.use_history {
        let path = config
            .persistence
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(FileStore::default_path);
        manager = manager.with_store(Arc::new(FileStore::new(path)));

        if fresh {
            manager.clear_history().await?;
        } else {
            match manager.restore().await {
                Ok(true) => eprintln!("  (restored saved conversation — use --new to start over)"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "could not restore saved session, starting fresh"),
            }
        }
    }

    if let Some(text) = message {
        // Single message mode
        let response = manager.ask(&text).await?;
        println!("{}", response.content);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Ironquill — Interactive Chat");
    println!("  ----------------------------");
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {model}");
    println!(
        "  Tools:     {}",
        match &tool_service {
            Some(service) => service.name(),
            None => "none",
        }
    );
    println!("  History:   {}", if config.use_history { "on" } else { "off" });
    println!();
    println!("  Type your message and press Enter.");
    println!("  Commands: /clear resets the conversation, exit quits.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    prompt();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            prompt();
            continue;
        }
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }
        if line == "/clear" {
            manager.clear_history().await?;
            println!("  (conversation cleared)");
            prompt();
            continue;
        }

        match manager.ask(line).await {
            Ok(response) => {
                println!();
                for out in response.content.lines() {
                    println!("  Assistant > {out}");
                }
                if let Some(usage) = &response.usage {
                    tracing::debug!(total_tokens = usage.total_tokens, "turn usage");
                }
                println!();
            }
            Err(e) => {
                // The pending user message is retained; retrying re-sends
                // it as part of the next turn.
                eprintln!("  [Error] {e}");
                eprintln!("  Try again, or type 'exit' to quit.");
                println!();
            }
        }

        prompt();
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

fn prompt() {
    use std::io::Write;
    print!("  You > ");
    let _ = std::io::stdout().flush();
}

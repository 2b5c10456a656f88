//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use rsc_core::NavigatorConfig;

use super::{ConfigArgs, ConfigCommand};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Path => show_path(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    ctx.output.kv("content_endpoint", &ctx.config.content_endpoint);
    ctx.output.kv("action_endpoint", &ctx.config.action_endpoint);
    ctx.output
        .kv("refresh_on_pop", &ctx.config.refresh_on_pop.to_string());
    let capacity = ctx
        .config
        .cache_capacity
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unbounded".to_string());
    ctx.output.kv("cache_capacity", &capacity);

    Ok(())
}

fn show_path(ctx: &Context) -> Result<()> {
    let path = ctx
        .config_path
        .as_ref()
        .map(|p| p.display().to_string());

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "path": path }));
    } else {
        match path {
            Some(path) => println!("{}", path),
            None => ctx.output.info("No config file found; using defaults"),
        }
    }

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let content = toml::to_string_pretty(&NavigatorConfig::default())?;
    fs::write(&config_path, content)?;

    ctx.output
        .success(&format!("Created {}", config_path.display()));
    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    let Some(path) = &ctx.config_path else {
        ctx.output
            .warn("No config file found; defaults are always valid");
        return Ok(());
    };

    // Re-read so edits made since startup are checked.
    NavigatorConfig::load(path)?;
    ctx.output
        .success(&format!("{} is valid", path.display()));
    Ok(())
}

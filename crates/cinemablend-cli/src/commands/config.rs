use blend_config::{Config, PathManager, TmdbCredentials};
use color_eyre::eyre::{eyre, Result};
use comfy_table::{modifiers, presets, Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use serde_json::json;

use super::{load_config, load_credentials};
use crate::output::Output;

pub enum ConfigAction {
    Show { full: bool },
    Path,
    Init { force: bool },
    Tmdb {
        api_key: Option<String>,
        bearer_token: Option<String>,
    },
}

pub async fn run_config(action: ConfigAction, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    match action {
        ConfigAction::Show { full } => show_config(&paths, full, output),
        ConfigAction::Path => show_paths(&paths, output),
        ConfigAction::Init { force } => init_config(&paths, force, output),
        ConfigAction::Tmdb { api_key, bearer_token } => configure_tmdb(&paths, api_key, bearer_token, output),
    }
}

fn section(title: &str) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(vec![Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold)]);
    table
}

fn tick(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn show_config(paths: &PathManager, full: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!("No configuration file at {}; using defaults", config_file.display()));
    }
    let config = load_config(paths)?;
    let credentials = TmdbCredentials::resolve(load_credentials(paths).ok().as_ref());
    let display = |value: &Option<String>| match value {
        Some(v) if full => v.clone(),
        Some(v) => mask_string(v),
        None => "<not set>".to_string(),
    };

    if !output.is_human() {
        return output
            .data(&json!({
                "config_file": config_file.display().to_string(),
                "tmdb": config.tmdb,
                "session": config.session,
                "blend": config.blend,
                "credentials": {
                    "api_key": display(&credentials.api_key),
                    "bearer_token": display(&credentials.bearer_token),
                },
            }))
            .map_err(|e| eyre!("Failed to serialize config: {}", e));
    }
    if output.is_quiet() {
        return Ok(());
    }

    println!("Config file: {}\n", config_file.display().bright_white());

    let mut tmdb = section("TMDB");
    tmdb.add_row(vec![Cell::new("Enabled"), Cell::new(tick(config.tmdb.enabled))]);
    tmdb.add_row(vec![Cell::new("Base URL"), Cell::new(&config.tmdb.base_url)]);
    tmdb.add_row(vec![
        Cell::new("Max calls per second"),
        Cell::new(config.tmdb.max_calls_per_second),
    ]);
    tmdb.add_row(vec![
        Cell::new("Cache TTL"),
        Cell::new(format!("{} hours", config.tmdb.cache_ttl_hours)),
    ]);
    tmdb.add_row(vec![
        Cell::new("Minimum runtime"),
        Cell::new(format!("{} minutes", config.tmdb.min_runtime_minutes)),
    ]);
    tmdb.add_row(vec![Cell::new("Include adult"), Cell::new(tick(config.tmdb.include_adult))]);
    tmdb.add_row(vec![Cell::new("API key"), Cell::new(display(&credentials.api_key))]);
    tmdb.add_row(vec![Cell::new("Bearer token"), Cell::new(display(&credentials.bearer_token))]);
    println!("{}\n", tmdb);

    let mut session = section("Sessions");
    session.add_row(vec![
        Cell::new("Expiry"),
        Cell::new(format!("{} seconds", config.session.ttl_seconds)),
    ]);
    session.add_row(vec![
        Cell::new("Poll interval"),
        Cell::new(format!("{} ms", config.session.poll_interval_ms)),
    ]);
    session.add_row(vec![Cell::new("Max polls"), Cell::new(config.session.max_poll_attempts)]);
    session.add_row(vec![Cell::new("Backoff factor"), Cell::new(config.session.backoff_factor)]);
    session.add_row(vec![
        Cell::new("Max poll interval"),
        Cell::new(format!("{} ms", config.session.max_poll_interval_ms)),
    ]);
    println!("{}\n", session);

    let mut blend = section("Blend");
    blend.add_row(vec![Cell::new("Recent diary entries"), Cell::new(config.blend.recent_count)]);
    blend.add_row(vec![Cell::new("Clashes shown"), Cell::new(config.blend.clash_count)]);
    println!("{}", blend);
    Ok(())
}

fn show_paths(paths: &PathManager, output: &Output) -> Result<()> {
    let entries = [
        ("config_file", paths.config_file()),
        ("credentials_file", paths.credentials_file()),
        ("sessions_dir", paths.sessions_dir()),
        ("log_file", paths.default_log_file()),
    ];

    if output.is_human() {
        for (label, path) in &entries {
            println!("{:<18} {}", label, path.display());
        }
        return Ok(());
    }
    let map: serde_json::Map<String, serde_json::Value> = entries
        .iter()
        .map(|(label, path)| (label.to_string(), json!(path.display().to_string())))
        .collect();
    output
        .data(&map)
        .map_err(|e| eyre!("Failed to serialize paths: {}", e))
}

fn init_config(paths: &PathManager, force: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() && !force {
        output.warn(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_file.display()
        ));
        return Ok(());
    }

    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;
    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}

fn configure_tmdb(
    paths: &PathManager,
    api_key: Option<String>,
    bearer_token: Option<String>,
    output: &Output,
) -> Result<()> {
    if api_key.is_none() && bearer_token.is_none() {
        return Err(eyre!("Pass --api-key and/or --bearer-token"));
    }

    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;
    let mut store = load_credentials(paths)?;
    if let Some(key) = api_key {
        store.set_tmdb_api_key(key.trim().to_string());
    }
    if let Some(token) = bearer_token {
        store.set_tmdb_bearer_token(token.trim().to_string());
    }
    store
        .save()
        .map_err(|e| eyre!("Failed to save credentials: {}", e))?;
    output.success(format!("TMDB credentials saved to {}", paths.credentials_file().display()));
    Ok(())
}

fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use blend_config::{Config, PathManager, SessionConfig};
use blend_core::{BlendSession, FileSessionStore, SessionError, Sessions};
use blend_models::Pair;
use blend_sources::LetterboxdExport;
use color_eyre::eyre::{eyre, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde_json::json;
use tracing::info;

use super::{blend::compute, is_interactive, load_config, load_side, render, Side};
use crate::output::Output;

const CODE_LENGTH: usize = 6;

pub enum SessionAction {
    Create {
        export: PathBuf,
        name: Option<String>,
        wait: bool,
        with_metadata: bool,
    },
    Join {
        code: String,
        export: PathBuf,
        name: Option<String>,
        with_metadata: bool,
    },
    Wait {
        code: String,
        with_metadata: bool,
    },
}

/// Short uppercase code taken from a v4 UUID.
pub fn generate_code() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id.chars().take(CODE_LENGTH).collect::<String>().to_uppercase()
}

fn open_sessions(config: &SessionConfig, paths: &PathManager) -> Result<Sessions> {
    let store = FileSessionStore::new(paths.sessions_dir())
        .map_err(|e| eyre!("Failed to open session store: {}", e))?;
    Ok(Sessions::from_config(Arc::new(store), config))
}

pub async fn run_session(action: SessionAction, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config = load_config(&paths)?;
    let sessions = open_sessions(&config.session, &paths)?;

    match action {
        SessionAction::Create {
            export,
            name,
            wait,
            with_metadata,
        } => {
            let side = load_side(&export, name)?;
            let code = generate_code();
            sessions.create(&code, &side.name, &side.export.films).await?;

            if output.is_human() {
                println!("Session code: {}", code.bright_green().bold());
                output.info(format!("Share it: cinemablend session join {} --export <path>", code));
            } else {
                output
                    .data(&json!({ "code": code, "name": side.name, "films": side.export.films.len() }))
                    .map_err(|e| eyre!("Failed to serialize session: {}", e))?;
            }

            if wait {
                let session = wait_for_partner(&sessions, &code, output).await?;
                blend_session(&session, with_metadata, &config, &paths, output).await?;
            }
            Ok(())
        }
        SessionAction::Join {
            code,
            export,
            name,
            with_metadata,
        } => {
            let side = load_side(&export, name)?;
            let session = match sessions.join(&code, &side.name, &side.export.films).await {
                Ok(session) => session,
                Err(SessionError::NotFound(code)) => {
                    return Err(eyre!("No session with code {} (it may have expired)", code));
                }
                Err(e) => return Err(e.into()),
            };
            output.success(format!("Joined {}'s session", session.p1_name));
            blend_session(&session, with_metadata, &config, &paths, output).await
        }
        SessionAction::Wait { code, with_metadata } => {
            let session = wait_for_partner(&sessions, &code, output).await?;
            blend_session(&session, with_metadata, &config, &paths, output).await
        }
    }
}

async fn wait_for_partner(sessions: &Sessions, code: &str, output: &Output) -> Result<BlendSession> {
    let spinner = (output.is_human() && is_interactive()).then(|| {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
            spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(format!("Waiting for someone to join {}...", code));
        spinner
    });

    let waited = tokio::select! {
        result = sessions.wait_for_partner(code) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }

    match waited {
        Some(Ok(session)) => {
            info!(code = %code, "Partner joined");
            Ok(session)
        }
        Some(Err(SessionError::TimedOut { attempts })) => Err(eyre!(
            "Nobody joined {} after {} checks; the code stays valid until it expires",
            code,
            attempts
        )),
        Some(Err(e)) => Err(e.into()),
        None => Err(eyre!("Stopped waiting for {}", code)),
    }
}

async fn blend_session(
    session: &BlendSession,
    with_metadata: bool,
    config: &Config,
    paths: &PathManager,
    output: &Output,
) -> Result<()> {
    let (films1, films2) = session
        .collections()
        .ok_or_else(|| eyre!("Session has no second side yet"))?;
    let partner = session.p2_name.clone().unwrap_or_else(|| "Someone".to_string());

    let left = Side {
        name: session.p1_name.clone(),
        export: LetterboxdExport { films: films1, diary: Vec::new() },
    };
    let right = Side {
        name: partner,
        export: LetterboxdExport { films: films2, diary: Vec::new() },
    };

    let result = compute(&left, &right, with_metadata, config.tmdb.min_runtime_minutes, config, paths, output).await;
    let names = Pair::new(left.name, right.name);
    render::print_result(output, &names, &result, config.blend.clash_count);
    Ok(())
}

use std::path::PathBuf;

use blend_config::PathManager;
use blend_models::{BlendResult, Pair};
use blend_sources::letterboxd::recent_diary;
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info;

use super::{build_gateway, is_interactive, load_config, load_side, render, Side};
use crate::output::Output;

pub struct BlendArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    pub left_name: Option<String>,
    pub right_name: Option<String>,
    pub with_metadata: bool,
    pub min_runtime: Option<u32>,
    pub clashes: Option<usize>,
}

pub async fn run_blend(args: BlendArgs, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config = load_config(&paths)?;

    let left = load_side(&args.left, args.left_name)?;
    let right = load_side(&args.right, args.right_name)?;
    if left.export.films.is_empty() && right.export.films.is_empty() {
        output.warn("Both exports are empty; the score will be 0");
    }

    let min_runtime = args.min_runtime.unwrap_or(config.tmdb.min_runtime_minutes);
    let result = compute(&left, &right, args.with_metadata, min_runtime, &config, &paths, output).await;

    let names = Pair::new(left.name, right.name);
    let clash_count = args.clashes.unwrap_or(config.blend.clash_count);
    render::print_result(output, &names, &result, clash_count);
    Ok(())
}

/// Score two loaded sides, optionally enriching the niche comparison.
pub(crate) async fn compute(
    left: &Side,
    right: &Side,
    with_metadata: bool,
    min_runtime: u32,
    config: &blend_config::Config,
    paths: &PathManager,
    output: &Output,
) -> BlendResult {
    let recent1 = recent_diary(&left.export.diary, config.blend.recent_count);
    let recent2 = recent_diary(&right.export.diary, config.blend.recent_count);

    if !with_metadata {
        return blend_core::blend(&left.export.films, &right.export.films, &recent1, &recent2);
    }

    let gateway = build_gateway(config, paths);
    if gateway.is_none() {
        output.warn("No TMDB credential configured; niche picks use local placeholders");
    }

    let spinner = (output.is_human() && is_interactive()).then(|| {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
        {
            spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Looking up film metadata...");
        spinner
    });

    let result = blend_core::blend_with_metadata(
        gateway.as_ref(),
        &left.export.films,
        &right.export.films,
        &recent1,
        &recent2,
        min_runtime,
    )
    .await;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    if let Some(gateway) = &gateway {
        info!(
            provider = gateway.provider_name(),
            requests = gateway.dispatch_count(),
            "Metadata enrichment finished"
        );
    }
    result
}

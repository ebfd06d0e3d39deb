//! scalechain-inspect: prepare a model, replay interactions and print the
//! resulting render frame as JSON.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use scalechain_core::{PreparedModel, StateNo, VisualizationConfig};
use scalechain_visualization::{LinkedViewController, RenderFrame, SyncOutcome, TimeRange};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect a multi-scale Markov chain model", long_about = None)]
struct Cli {
    /// Model document (JSON, bare or wrapped in a record)
    model: PathBuf,

    /// Visualization configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Probability threshold for the graph view
    #[arg(long)]
    threshold: Option<f64>,

    /// Scale to show; fractional values are floored
    #[arg(long)]
    scale: Option<f64>,

    /// State to select on the shown scale
    #[arg(long)]
    select: Option<StateNo>,

    /// Time window as START END in Unix seconds
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    window: Option<Vec<f64>>,

    /// Indent the output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => VisualizationConfig::load(path)?,
        None => VisualizationConfig::default(),
    };

    let document = fs::read_to_string(&cli.model)
        .with_context(|| format!("cannot read model {}", cli.model.display()))?;
    let frame = replay(&cli, &document, &config)?;

    println!("{}", frame.to_json(cli.pretty)?);
    Ok(())
}

/// Prepare the model and apply the requested interactions in slider order:
/// scale, threshold, selection, then time window.
fn replay(cli: &Cli, document: &str, config: &VisualizationConfig) -> Result<RenderFrame> {
    let prepared = PreparedModel::from_json_str(document, config)
        .with_context(|| format!("cannot prepare model {}", cli.model.display()))?;

    let mut controller = LinkedViewController::new(Arc::new(prepared), config);

    if let Some(scale) = cli.scale {
        controller.on_scale_changed(scale);
    }
    if let Some(threshold) = cli.threshold {
        controller.on_threshold_changed(threshold);
    }
    if let Some(state_no) = cli.select {
        if controller.on_state_selected(state_no).is_none() {
            bail!(
                "state {} does not exist on scale {}",
                state_no,
                controller.state().selected_scale_index()
            );
        }
    }
    if let Some(&[start, end]) = cli.window.as_deref() {
        if controller.on_overview_brushed(TimeRange::new(start, end)) == SyncOutcome::Ignored {
            log::warn!("Time window {}..{} ignored", start, end);
        }
    }

    Ok(controller.frame())
}

//! CLI tool for heatgrid - replays a pointer trace against a heat map dataset
//!
//! Usage:
//!   heatgrid_cli <dataset.json> <trace.json>                  # Events as JSON lines on stdout
//!   heatgrid_cli <dataset.json> <trace.json> --config cfg.json --left 100 --top 40

use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use heatgrid::hover::{GridHoverController, HoverEvent, PointerChannel};
use heatgrid::{Dataset, GridBounds, HeatmapConfig, PointerPosition};

#[derive(Parser)]
#[command(
    name = "heatgrid_cli",
    about = "Replay pointer positions over a heat map and print hover events",
    version
)]
struct Cli {
    /// Dataset JSON (array of rows)
    dataset: PathBuf,

    /// Pointer trace JSON (array of {"x", "y"} viewport points)
    trace: PathBuf,

    /// Heat map config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid left edge in viewport pixels
    #[arg(long, default_value = "0")]
    left: f64,

    /// Grid top edge in viewport pixels
    #[arg(long, default_value = "0")]
    top: f64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let dataset_json = fs::read_to_string(&cli.dataset)
        .with_context(|| format!("reading {}", cli.dataset.display()))?;
    let dataset = Dataset::from_json(&dataset_json).context("parsing dataset")?;

    let trace_json = fs::read_to_string(&cli.trace)
        .with_context(|| format!("reading {}", cli.trace.display()))?;
    let trace: Vec<PointerPosition> =
        serde_json::from_str(&trace_json).context("parsing pointer trace")?;

    let config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            HeatmapConfig::from_json(&json).context("parsing config")?
        }
        None => HeatmapConfig::default(),
    };

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let mut controller =
        GridHoverController::new(config, Rc::new(dataset), move |event: HoverEvent| {
            sink.borrow_mut().push(event);
        })?;

    let scales = controller.scales();
    tracing::info!(
        rows = scales.shape.rows,
        columns = scales.shape.columns,
        width = scales.pixel_width,
        height = scales.pixel_height,
        points = trace.len(),
        "replaying pointer trace"
    );

    let pointer = PointerChannel::new();
    controller.attach(
        &pointer,
        GridBounds::from_origin(cli.left, cli.top, scales.pixel_width, scales.pixel_height),
    );
    for position in trace {
        pointer.emit(position);
    }
    controller.detach();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for event in events.borrow().iter() {
        serde_json::to_writer(&mut out, event)?;
        writeln!(out)?;
    }
    Ok(())
}

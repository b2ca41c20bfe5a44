//! spfdispd entry point.

use anyhow::Context;
use clap::Parser;
use log::info;
use ofdispatch_core::{LogEmitter, Mode};
use spfdispd::daemon::{Evaluation, EvaluationConfig};
use spfdispd::topology::TopologySpec;
use std::path::PathBuf;
use std::sync::Arc;

/// Shortest-path evaluation daemon
#[derive(Parser, Debug)]
#[command(name = "spfdispd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Initial number of active workers
    #[arg(short = 'w', long, default_value = "1")]
    workers: usize,

    /// Initial execution mode (mono or multi)
    #[arg(short = 'm', long, default_value = "mono")]
    mode: Mode,

    /// Topology file (JSON); the built-in evaluation topology if omitted
    #[arg(short = 't', long)]
    topology: Option<PathBuf>,

    /// Seed for link-cost generation (random if omitted)
    #[arg(long)]
    cost_seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    info!("starting spfdispd (shortest-path evaluation daemon)");
    info!("initial workers: {}", args.workers);
    info!("initial mode: {}", args.mode);
    if let Some(seed) = args.cost_seed {
        info!("cost seed: {}", seed);
    }

    let topology = match &args.topology {
        Some(path) => {
            info!("loading topology from {}", path.display());
            TopologySpec::from_file(path)
                .with_context(|| format!("failed to load topology {}", path.display()))?
        }
        None => TopologySpec::reference(),
    };
    info!("topology: {} links", topology.links.len());

    let emitter = Arc::new(LogEmitter::new());
    let config = EvaluationConfig {
        workers: args.workers,
        mode: args.mode,
        cost_seed: args.cost_seed,
    };
    let mut eval = Evaluation::new(topology, config, emitter.clone())
        .context("failed to start the evaluation pipeline")?;

    spfdispd::console::run(&mut eval).await?;

    let forwarded = eval.shutdown().await;
    info!(
        "shutdown complete: {} decisions forwarded by the sink, {} total emitted",
        forwarded,
        emitter.emitted()
    );
    Ok(())
}

//! l2dispd entry point.

use anyhow::Context;
use clap::Parser;
use l2dispd::daemon::{Evaluation, EvaluationConfig};
use log::info;
use ofdispatch_core::{LogEmitter, Mode};
use std::sync::Arc;

/// Learning-switch evaluation daemon
#[derive(Parser, Debug)]
#[command(name = "l2dispd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Initial number of active workers
    #[arg(short = 'w', long, default_value = "1")]
    workers: usize,

    /// Initial execution mode (mono or multi)
    #[arg(short = 'm', long, default_value = "mono")]
    mode: Mode,

    /// Synthetic per-frame spin count
    #[arg(long, default_value = "0")]
    extra_load: u64,

    /// Number of datapaths the injector spreads frames over
    #[arg(long, default_value = "4")]
    datapaths: u64,

    /// Seed for injected traffic (random if omitted)
    #[arg(long)]
    frame_seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    info!("starting l2dispd (learning-switch evaluation daemon)");
    info!("initial workers: {}", args.workers);
    info!("initial mode: {}", args.mode);
    info!("injector datapaths: {}", args.datapaths);

    let emitter = Arc::new(LogEmitter::new());
    let config = EvaluationConfig {
        workers: args.workers,
        mode: args.mode,
        extra_load: args.extra_load,
        datapaths: args.datapaths,
        frame_seed: args.frame_seed,
    };
    let mut eval = Evaluation::new(config, emitter.clone())
        .context("failed to start the evaluation pipeline")?;

    l2dispd::console::run(&mut eval).await?;

    let forwarded = eval.shutdown().await;
    info!(
        "shutdown complete: {} decisions forwarded by the sink, {} total emitted",
        forwarded,
        emitter.emitted()
    );
    Ok(())
}

//! The evaluation coordinator.

use crate::engine::{L2Engine, L2Frame};
use crate::error::Result;
use ofdispatch_core::{
    DecisionEmitter, DispatchStats, Dispatcher, Mode, ModeGate, PoolStats,
    ResultSink, WorkerPool,
};
use ofdispatch_types::{BufferId, DatapathId, MacAddress, PortNo};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Startup configuration for the evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    /// Initial number of active workers.
    pub workers: usize,
    /// Initial execution mode.
    pub mode: Mode,
    /// Synthetic per-frame spin count.
    pub extra_load: u64,
    /// Number of datapaths the injector spreads frames over.
    pub datapaths: u64,
    /// Seed for injected traffic; random when absent.
    pub frame_seed: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            mode: Mode::Mono,
            extra_load: 0,
            datapaths: 4,
            frame_seed: None,
        }
    }
}

/// Counter snapshot for the `stats` command.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationStats {
    /// Current execution mode.
    pub mode: Mode,
    /// Dispatch-eligible workers.
    pub active_workers: usize,
    /// Workers ever spawned.
    pub spawned_workers: usize,
    /// Workers still alive.
    pub live_workers: usize,
    /// Synthetic frames injected.
    pub injected: u64,
    /// Stations learned by the inline engine (workers keep their own).
    pub inline_stations: usize,
    /// Dispatcher counters.
    pub dispatch: DispatchStats,
    /// Pool counters.
    pub pool: PoolStats,
}

impl fmt::Display for EvaluationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mode: {}", self.mode)?;
        writeln!(
            f,
            "workers: {} active / {} spawned / {} live",
            self.active_workers, self.spawned_workers, self.live_workers
        )?;
        writeln!(f, "injected: {}", self.injected)?;
        writeln!(f, "inline stations learned: {}", self.inline_stations)?;
        writeln!(f, "inline: {} decided", self.dispatch.inline_decided)?;
        write!(
            f,
            "pooled: {} dispatched, {} dropped",
            self.pool.dispatched, self.pool.dropped + self.dispatch.pool_dropped
        )
    }
}

/// Number of distinct station MACs the injector draws from per run.
const INJECT_STATIONS: u8 = 16;

/// Owns the full evaluation pipeline: mode gate, dispatcher, worker pool,
/// result sink, and the synthetic frame injector.
///
/// There is no shared broadcast state in the learning-switch variant:
/// every engine replica builds its forwarding tables purely from the
/// frames it observes.
pub struct Evaluation {
    gate: ModeGate,
    dispatcher: Dispatcher<L2Engine>,
    cancel: CancellationToken,
    sink: JoinHandle<u64>,
    rng: StdRng,
    datapaths: u64,
    next_buffer: u32,
    injected: u64,
}

impl Evaluation {
    /// Builds the pipeline and spawns the initial workers.
    ///
    /// Must be called from within a Tokio runtime (the result sink is
    /// spawned here).
    pub fn new(config: EvaluationConfig, emitter: Arc<dyn DecisionEmitter>) -> Result<Self> {
        let rng = match config.frame_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let gate = ModeGate::new(config.mode);
        let extra_load = config.extra_load;
        let (pool, registrations) = WorkerPool::new(move || L2Engine::new(extra_load));
        let inline = L2Engine::new(config.extra_load);
        let mut dispatcher = Dispatcher::new(gate.watch(), inline, pool, emitter.clone());
        dispatcher.pool_mut().resize(config.workers.max(1))?;

        let cancel = CancellationToken::new();
        let sink = ResultSink::new(registrations, gate.watch(), emitter, cancel.clone());
        let sink = tokio::spawn(sink.run());

        if config.extra_load > 0 {
            info!("synthetic per-frame load: {} iterations", config.extra_load);
        }
        info!("now working in {} mode", gate.mode());
        Ok(Self {
            gate,
            dispatcher,
            cancel,
            sink,
            rng,
            datapaths: config.datapaths.max(1),
            next_buffer: 0,
            injected: 0,
        })
    }

    /// Current execution mode.
    pub fn mode(&self) -> Mode {
        self.gate.mode()
    }

    /// Switches between single-threaded and pooled execution.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.gate.set(mode) {
            info!("now working in {} mode", mode);
        } else {
            info!("already in {} mode", mode);
        }
    }

    /// Sets the active worker count; growth spawns new workers, shrinking
    /// leaves spawned workers idle.
    pub fn set_worker_count(&mut self, count: usize) -> Result<()> {
        self.dispatcher.pool_mut().resize(count)?;
        Ok(())
    }

    /// Handles one inbound frame event.
    pub fn on_frame(&mut self, frame: L2Frame) {
        self.dispatcher.on_packet(frame);
    }

    /// Injects `count` random frames through the normal dispatch path.
    ///
    /// Frames are spread over the configured datapaths with source and
    /// destination MACs drawn from a small station pool, so learned
    /// forwarding and flooding both occur.
    pub fn inject(&mut self, count: u64) {
        for _ in 0..count {
            let frame = self.next_frame();
            self.on_frame(frame);
        }
        self.injected += count;
        info!("injected {} synthetic frames", count);
    }

    fn next_frame(&mut self) -> L2Frame {
        let datapath = DatapathId::new(self.rng.gen_range(1..=self.datapaths));
        let src = self.rng.gen_range(1..=INJECT_STATIONS);
        let mut dst = self.rng.gen_range(1..=INJECT_STATIONS);
        if dst == src {
            dst = dst % INJECT_STATIONS + 1;
        }
        let buffer_id = BufferId::new(self.next_buffer);
        self.next_buffer = self.next_buffer.wrapping_add(1);
        L2Frame {
            datapath,
            src: MacAddress::new([0, 0, 0, 0, 0, src]),
            dst: MacAddress::new([0, 0, 0, 0, 0, dst]),
            in_port: PortNo::new(u16::from(src)),
            buffer_id,
        }
    }

    /// Counter snapshot.
    pub fn stats(&self) -> EvaluationStats {
        let pool = self.dispatcher.pool();
        EvaluationStats {
            mode: self.mode(),
            active_workers: pool.active_count(),
            spawned_workers: pool.spawned_count(),
            live_workers: pool.live_count(),
            injected: self.injected,
            inline_stations: self.dispatcher.inline().tables().station_count(),
            dispatch: self.dispatcher.stats(),
            pool: pool.stats(),
        }
    }

    /// Stops the pipeline: workers drain their queues and join, then the
    /// sink drains every remaining result and exits.
    pub async fn shutdown(mut self) -> u64 {
        self.dispatcher.pool_mut().shutdown();
        self.cancel.cancel();
        match self.sink.await {
            Ok(forwarded) => forwarded,
            Err(err) => {
                warn!("result sink task failed: {}", err);
                0
            }
        }
    }
}

//! The evaluation coordinator.

use crate::engine::{PathRequest, SpfEngine};
use crate::error::Result;
use crate::topology::TopologySpec;
use ofdispatch_core::{
    AdjacencyTable, DecisionEmitter, DispatchStats, Dispatcher, Mode, ModeGate,
    PoolStats, ResultSink, WorkerPool,
};
use ofdispatch_types::BufferId;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
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
    /// Seed for link-cost generation; random when absent.
    pub cost_seed: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            mode: Mode::Mono,
            cost_seed: None,
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
    /// Synthetic packet events injected.
    pub injected: u64,
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
        writeln!(
            f,
            "inline: {} decided, {} no-route",
            self.dispatch.inline_decided, self.dispatch.inline_no_route
        )?;
        write!(
            f,
            "pooled: {} dispatched, {} dropped",
            self.pool.dispatched, self.pool.dropped + self.dispatch.pool_dropped
        )
    }
}

/// Owns the full evaluation pipeline: mode gate, dispatcher, worker pool,
/// result sink, the authoritative topology, and the synthetic injector.
///
/// All mutation (mode flips, resize, cost regeneration, injection) runs
/// on the coordinating task; workers only ever see broadcast snapshots
/// and work items.
pub struct Evaluation {
    topology: TopologySpec,
    rng: StdRng,
    gate: ModeGate,
    dispatcher: Dispatcher<SpfEngine>,
    cancel: CancellationToken,
    sink: JoinHandle<u64>,
    next_buffer: u32,
    next_ingress: usize,
    injected: u64,
}

impl Evaluation {
    /// Builds the pipeline and spawns the initial workers, each seeded
    /// with the freshly generated adjacency table.
    ///
    /// Must be called from within a Tokio runtime (the result sink is
    /// spawned here).
    pub fn new(
        topology: TopologySpec,
        config: EvaluationConfig,
        emitter: Arc<dyn DecisionEmitter>,
    ) -> Result<Self> {
        topology.validate()?;
        let mut rng = match config.cost_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let adj = topology.generate_costs(&mut rng);
        let resolver = topology.resolver();

        let gate = ModeGate::new(config.mode);
        let worker_resolver = resolver.clone();
        let (pool, registrations) = WorkerPool::new(move || {
            SpfEngine::new(worker_resolver.clone(), AdjacencyTable::new())
        });
        let inline = SpfEngine::new(resolver, adj.clone());
        let mut dispatcher = Dispatcher::new(gate.watch(), inline, pool, emitter.clone());

        // Seed first, then spawn: every worker holds the table current at
        // its spawn time before it can receive any work item.
        dispatcher.pool_mut().broadcast_state(adj);
        dispatcher.pool_mut().resize(config.workers.max(1))?;

        let cancel = CancellationToken::new();
        let sink = ResultSink::new(registrations, gate.watch(), emitter, cancel.clone());
        let sink = tokio::spawn(sink.run());

        info!("now working in {} mode", gate.mode());
        Ok(Self {
            topology,
            rng,
            gate,
            dispatcher,
            cancel,
            sink,
            next_buffer: 0,
            next_ingress: 0,
            injected: 0,
        })
    }

    /// Current execution mode.
    pub fn mode(&self) -> Mode {
        self.gate.mode()
    }

    /// Switches between single-threaded and pooled execution.
    ///
    /// One atomic flip: the dispatcher picks the new path for the next
    /// packet and the result sink suspends or resumes accordingly.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.gate.set(mode) {
            info!("now working in {} mode", mode);
        } else {
            info!("already in {} mode", mode);
        }
    }

    /// Sets the active worker count; growth spawns and seeds new workers,
    /// shrinking leaves spawned workers idle.
    pub fn set_worker_count(&mut self, count: usize) -> Result<()> {
        self.dispatcher.pool_mut().resize(count)?;
        Ok(())
    }

    /// Regenerates all link costs, replaces the authoritative table and
    /// broadcasts the new snapshot to the inline engine and every worker.
    pub fn regenerate_costs(&mut self) {
        let adj = self.topology.generate_costs(&mut self.rng);
        self.dispatcher.apply_state(adj);
        info!("link costs regenerated, stored and sent to workers");
    }

    /// Handles one inbound packet event.
    pub fn on_packet(&mut self, request: PathRequest) {
        self.dispatcher.on_packet(request);
    }

    /// Injects `count` synthetic packet events through the normal
    /// dispatch path, rotating over the topology's ingress entries.
    pub fn inject(&mut self, count: u64) {
        if self.topology.ingress.is_empty() {
            warn!("no ingress entries in the topology, nothing to inject");
            return;
        }
        for _ in 0..count {
            let entry = self.topology.ingress[self.next_ingress];
            self.next_ingress = (self.next_ingress + 1) % self.topology.ingress.len();
            let buffer_id = BufferId::new(self.next_buffer);
            self.next_buffer = self.next_buffer.wrapping_add(1);
            self.on_packet(PathRequest {
                src: entry.src,
                origin: entry.origin,
                buffer_id,
            });
        }
        self.injected += count;
        info!("injected {} synthetic packet events", count);
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
            dispatch: self.dispatcher.stats(),
            pool: pool.stats(),
        }
    }

    /// Stops the pipeline: workers drain their queues and join, then the
    /// sink drains every remaining result and exits.
    ///
    /// Returns the number of decisions the sink forwarded over its
    /// lifetime.
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

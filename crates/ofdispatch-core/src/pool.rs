//! The dynamically-sized worker pool.

use crate::engine::DecisionEngine;
use crate::error::{PoolError, PoolResult};
use crate::message::{Decision, WorkerId, WorkerRequest};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;

/// Registration of a newly spawned worker's result channel, delivered to
/// the result sink.
pub type WorkerRegistration = (WorkerId, mpsc::UnboundedReceiver<Decision>);

/// Counters exposed by the pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    /// Work items handed to a worker.
    pub dispatched: u64,
    /// Work items dropped because no live worker could take them.
    pub dropped: u64,
    /// State snapshots broadcast to the pool.
    pub state_broadcasts: u64,
}

/// One worker unit's coordinator-side endpoints.
///
/// Created when the pool grows and never destroyed at runtime: shrinking
/// only lowers the active cursor, and `alive` is cleared only on an
/// irrecoverable channel failure.
struct WorkerHandle<E: DecisionEngine> {
    id: WorkerId,
    tx: mpsc::UnboundedSender<WorkerRequest<E::State, E::Item>>,
    join: Option<std::thread::JoinHandle<()>>,
    alive: bool,
}

/// The dynamically-sized collection of worker units.
///
/// The registry is append-only (arena-style): `resize` below the spawned
/// count only moves the active cursor, so already-spawned workers idle
/// instead of terminating, and a later grow reuses them. Round-robin
/// dispatch rotates over the active prefix of the registry, skipping dead
/// workers.
pub struct WorkerPool<E: DecisionEngine> {
    factory: Box<dyn Fn() -> E + Send>,
    workers: Vec<WorkerHandle<E>>,
    active: usize,
    cursor: usize,
    seed: Option<E::State>,
    registrations: mpsc::UnboundedSender<WorkerRegistration>,
    stats: PoolStats,
}

impl<E: DecisionEngine> WorkerPool<E> {
    /// Creates an empty pool.
    ///
    /// `factory` builds one engine instance per spawned worker. The
    /// returned receiver yields every new worker's result channel and is
    /// consumed by the result sink.
    pub fn new<F>(factory: F) -> (Self, mpsc::UnboundedReceiver<WorkerRegistration>)
    where
        F: Fn() -> E + Send + 'static,
    {
        let (reg_tx, reg_rx) = mpsc::unbounded_channel();
        let pool = Self {
            factory: Box::new(factory),
            workers: Vec::new(),
            active: 0,
            cursor: 0,
            seed: None,
            registrations: reg_tx,
            stats: PoolStats::default(),
        };
        (pool, reg_rx)
    }

    /// Number of workers ever spawned (monotonically non-decreasing).
    pub fn spawned_count(&self) -> usize {
        self.workers.len()
    }

    /// Number of workers eligible for dispatch.
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Number of workers still alive (spawned minus failed).
    pub fn live_count(&self) -> usize {
        self.workers.iter().filter(|w| w.alive).count()
    }

    /// Pool counters.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Sets the number of dispatch-eligible workers.
    ///
    /// Growing spawns the missing workers, each seeded with the current
    /// state snapshot before it can receive any work item; existing
    /// workers and their in-flight items are untouched. Shrinking only
    /// lowers the active cursor. On a spawn failure the pool keeps the
    /// workers spawned so far and the previous active count.
    pub fn resize(&mut self, target: usize) -> PoolResult<()> {
        if target == 0 {
            return Err(PoolError::ZeroWorkers);
        }
        while self.workers.len() < target {
            self.spawn_worker()?;
        }
        self.active = target;
        // Restart the rotation so post-resize assignment order is predictable.
        self.cursor = 0;
        info!(
            "worker pool resized: {} active, {} spawned",
            self.active,
            self.workers.len()
        );
        Ok(())
    }

    /// Sends a work item to the next worker in round-robin order.
    ///
    /// Fire-and-forget: the request channels are unbounded, so this never
    /// blocks. A worker whose channel is gone is marked dead, excluded
    /// from the rotation, and the item moves on to the next live worker.
    /// Returns the id of the worker that took the item.
    pub fn dispatch(&mut self, item: E::Item) -> PoolResult<WorkerId> {
        let mut item = item;
        for _ in 0..self.active {
            let idx = self.cursor;
            self.cursor = (self.cursor + 1) % self.active;
            let worker = &mut self.workers[idx];
            if !worker.alive {
                continue;
            }
            match worker.tx.send(WorkerRequest::Work(item)) {
                Ok(()) => {
                    self.stats.dispatched += 1;
                    return Ok(worker.id);
                }
                Err(failed) => {
                    self.mark_dead(idx);
                    match failed.0 {
                        WorkerRequest::Work(recovered) => item = recovered,
                        // Only work items are sent here.
                        _ => break,
                    }
                }
            }
        }
        self.stats.dropped += 1;
        Err(PoolError::NoWorkers)
    }

    /// Broadcasts a full state snapshot to every spawned worker.
    ///
    /// The snapshot also becomes the seed for workers spawned later, so a
    /// resize racing a broadcast converges: either the new worker was
    /// spawned first and is included in this broadcast, or it is seeded
    /// from this snapshot at spawn time.
    pub fn broadcast_state(&mut self, state: E::State) {
        self.seed = Some(state.clone());
        self.stats.state_broadcasts += 1;
        for idx in 0..self.workers.len() {
            let worker = &mut self.workers[idx];
            if !worker.alive {
                continue;
            }
            if worker.tx.send(WorkerRequest::StateUpdate(state.clone())).is_err() {
                self.mark_dead(idx);
            }
        }
        debug!("state snapshot broadcast to {} workers", self.live_count());
    }

    /// Stops every worker and joins its thread.
    ///
    /// Each worker drains its queued messages before seeing the shutdown
    /// request, so all results for already-dispatched items reach the
    /// result channels first.
    pub fn shutdown(&mut self) {
        for worker in &mut self.workers {
            if worker.alive {
                let _ = worker.tx.send(WorkerRequest::Shutdown);
            }
        }
        for worker in &mut self.workers {
            if let Some(join) = worker.join.take() {
                if join.join().is_err() {
                    error!("worker {} panicked during shutdown", worker.id);
                }
            }
            worker.alive = false;
        }
        info!("worker pool shut down ({} workers joined)", self.workers.len());
    }

    fn spawn_worker(&mut self) -> PoolResult<()> {
        let id = WorkerId(self.workers.len());
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (res_tx, res_rx) = mpsc::unbounded_channel();
        let engine = (self.factory)();

        let join = std::thread::Builder::new()
            .name(format!("ofdispatch-worker-{}", id))
            .spawn(move || worker_loop(id, engine, req_rx, res_tx))
            .map_err(PoolError::Spawn)?;

        // Seed before anything else can be queued: the state snapshot is
        // the first message the worker receives.
        if let Some(seed) = &self.seed {
            let _ = req_tx.send(WorkerRequest::StateUpdate(seed.clone()));
        }
        // The sink may already have exited (tests without a sink); the
        // pool itself does not depend on the registration being consumed.
        let _ = self.registrations.send((id, res_rx));

        self.workers.push(WorkerHandle {
            id,
            tx: req_tx,
            join: Some(join),
            alive: true,
        });
        debug!("spawned worker {}", id);
        Ok(())
    }

    fn mark_dead(&mut self, idx: usize) {
        let worker = &mut self.workers[idx];
        if worker.alive {
            worker.alive = false;
            error!(
                "worker {} channel closed, marking dead; queued work items on it are lost",
                worker.id
            );
        }
    }
}

/// The worker unit's loop, run on a dedicated OS thread.
///
/// The worker owns a private engine instance and never initiates
/// communication other than sending results. It terminates when it
/// receives [`WorkerRequest::Shutdown`] or when both channel peers are
/// gone.
fn worker_loop<E: DecisionEngine>(
    id: WorkerId,
    mut engine: E,
    mut requests: mpsc::UnboundedReceiver<WorkerRequest<E::State, E::Item>>,
    results: mpsc::UnboundedSender<Decision>,
) {
    debug!("worker {} started", id);
    while let Some(request) = requests.blocking_recv() {
        match request {
            WorkerRequest::StateUpdate(state) => {
                engine.apply_state(state);
                debug!("worker {} applied state snapshot", id);
            }
            WorkerRequest::Work(item) => match engine.decide(item) {
                Some(decision) => {
                    if results.send(decision).is_err() {
                        warn!("worker {} result channel closed, stopping", id);
                        break;
                    }
                }
                None => debug!("worker {} dropped work item: no route", id),
            },
            WorkerRequest::Shutdown => break,
        }
    }
    debug!("worker {} stopped", id);
}

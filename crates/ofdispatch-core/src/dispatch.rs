//! The event-boundary dispatcher.

use crate::boundary::DecisionEmitter;
use crate::engine::DecisionEngine;
use crate::gate::Mode;
use crate::pool::WorkerPool;
use log::{debug, error};
use std::sync::Arc;
use tokio::sync::watch;

/// Counters exposed by the dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchStats {
    /// Decisions computed inline in single-threaded mode.
    pub inline_decided: u64,
    /// Inline work items dropped because no decision was possible.
    pub inline_no_route: u64,
    /// Work items handed to the pool in multi mode.
    pub pooled: u64,
    /// Work items the pool could not place on any worker.
    pub pool_dropped: u64,
}

/// Routes each inbound packet event to the inline engine or the pool.
///
/// Holds a receiver of the mode gate's watch channel: the mode it reads
/// and the gate the result sink waits on are the same watched value, so a
/// single flip switches both sides and the dispatcher never enqueues to
/// the pool while the sink is suspended.
pub struct Dispatcher<E: DecisionEngine> {
    mode: watch::Receiver<Mode>,
    inline: E,
    pool: WorkerPool<E>,
    emitter: Arc<dyn DecisionEmitter>,
    stats: DispatchStats,
}

impl<E: DecisionEngine> Dispatcher<E> {
    /// Creates a dispatcher.
    ///
    /// `inline` is the engine used for single-threaded mode; `mode` comes
    /// from [`ModeGate::watch`](crate::ModeGate::watch).
    pub fn new(
        mode: watch::Receiver<Mode>,
        inline: E,
        pool: WorkerPool<E>,
        emitter: Arc<dyn DecisionEmitter>,
    ) -> Self {
        Self {
            mode,
            inline,
            pool,
            emitter,
            stats: DispatchStats::default(),
        }
    }

    /// Handles one inbound packet event.
    ///
    /// Mono: compute inline and emit directly to the boundary, bypassing
    /// pool and result channels. Multi: round-robin onto the pool.
    pub fn on_packet(&mut self, item: E::Item) {
        let mode = *self.mode.borrow();
        match mode {
            Mode::Mono => match self.inline.decide(item) {
                Some(decision) => {
                    self.stats.inline_decided += 1;
                    self.emitter.emit(&decision);
                }
                None => {
                    self.stats.inline_no_route += 1;
                    debug!("inline decision dropped: no route");
                }
            },
            Mode::Multi => match self.pool.dispatch(item) {
                Ok(_) => self.stats.pooled += 1,
                Err(err) => {
                    self.stats.pool_dropped += 1;
                    error!("dispatch failed: {}", err);
                }
            },
        }
    }

    /// Replaces the shared state everywhere: the inline engine first,
    /// then a broadcast to every spawned worker.
    pub fn apply_state(&mut self, state: E::State) {
        self.inline.apply_state(state.clone());
        self.pool.broadcast_state(state);
    }

    /// The inline engine (read-only inspection).
    pub fn inline(&self) -> &E {
        &self.inline
    }

    /// The worker pool (for resize and inspection).
    pub fn pool_mut(&mut self) -> &mut WorkerPool<E> {
        &mut self.pool
    }

    /// The worker pool, read-only.
    pub fn pool(&self) -> &WorkerPool<E> {
        &self.pool
    }

    /// Dispatcher counters.
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}

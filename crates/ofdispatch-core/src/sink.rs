//! The result sink: drains worker results into the network boundary.

use crate::boundary::DecisionEmitter;
use crate::gate::Mode;
use crate::message::{Decision, WorkerId};
use crate::pool::WorkerRegistration;
use futures::FutureExt;
use log::{debug, info};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{StreamExt, StreamMap};
use tokio_util::sync::CancellationToken;

/// Background loop forwarding completed decisions to the boundary.
///
/// All worker result channels are merged through a [`StreamMap`], so the
/// sink waits on whichever worker produces next instead of polling each
/// channel in turn; an idle worker never delays delivery from a busy one.
/// Newly spawned workers are picked up at runtime through the pool's
/// registration channel.
///
/// The mode gate suspends the whole loop while single-threaded mode is
/// engaged: the task parks in `watch::Receiver::changed` and consumes
/// nothing. Results produced by workers during that interval stay queued
/// in their channels (bounded by the traffic dispatched to the pool
/// before the flip) and are delivered after the next disengage. A
/// delivery in progress always completes before the loop re-examines the
/// gate.
pub struct ResultSink {
    streams: StreamMap<WorkerId, UnboundedReceiverStream<Decision>>,
    registrations: mpsc::UnboundedReceiver<WorkerRegistration>,
    gate: watch::Receiver<Mode>,
    emitter: Arc<dyn DecisionEmitter>,
    cancel: CancellationToken,
    forwarded: u64,
}

impl ResultSink {
    /// Creates a sink.
    ///
    /// `registrations` comes from [`WorkerPool::new`](crate::WorkerPool::new),
    /// `gate` from [`ModeGate::watch`](crate::ModeGate::watch). Cancelling
    /// `cancel` stops the loop after a final drain of every decision
    /// already available.
    pub fn new(
        registrations: mpsc::UnboundedReceiver<WorkerRegistration>,
        gate: watch::Receiver<Mode>,
        emitter: Arc<dyn DecisionEmitter>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            streams: StreamMap::new(),
            registrations,
            gate,
            emitter,
            cancel,
            forwarded: 0,
        }
    }

    /// Runs until cancelled. Returns the number of decisions forwarded.
    pub async fn run(mut self) -> u64 {
        info!("result sink started");
        loop {
            // Suspended while the gate is engaged: no polling, no
            // consumption, until the mode flips or shutdown begins.
            while self.gate.borrow_and_update().is_mono() {
                tokio::select! {
                    _ = self.cancel.cancelled() => return self.finish(),
                    changed = self.gate.changed() => {
                        if changed.is_err() {
                            return self.finish();
                        }
                    }
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return self.finish(),
                // Wake up to re-examine the gate on every flip.
                changed = self.gate.changed() => {
                    if changed.is_err() {
                        return self.finish();
                    }
                }
                Some((id, results)) = self.registrations.recv() => {
                    self.register(id, results);
                }
                Some((_, decision)) = self.streams.next(), if !self.streams.is_empty() => {
                    self.forward(&decision);
                }
            }
        }
    }

    fn register(&mut self, id: WorkerId, results: mpsc::UnboundedReceiver<Decision>) {
        debug!("result sink: watching worker {}", id);
        self.streams.insert(id, UnboundedReceiverStream::new(results));
    }

    fn forward(&mut self, decision: &Decision) {
        self.emitter.emit(decision);
        self.forwarded += 1;
    }

    /// Drain-then-stop: pick up any unseen registrations, forward every
    /// decision already sitting in a result channel, then exit.
    fn finish(mut self) -> u64 {
        while let Ok((id, results)) = self.registrations.try_recv() {
            self.register(id, results);
        }
        while let Some(Some((_, decision))) = self.streams.next().now_or_never() {
            self.forward(&decision);
        }
        info!("result sink stopped, {} decisions forwarded", self.forwarded);
        self.forwarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::CollectingEmitter;
    use crate::gate::ModeGate;
    use ofdispatch_types::{BufferId, DatapathId, OutputPort, PortNo};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn decision(dpid: u64) -> Decision {
        Decision {
            datapath: DatapathId::new(dpid),
            action: OutputPort::Port(PortNo::new(1)),
            buffer_id: BufferId::new(dpid as u32),
            in_port: None,
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached within 2s");
    }

    struct Fixture {
        reg_tx: mpsc::UnboundedSender<WorkerRegistration>,
        gate: ModeGate,
        emitter: Arc<CollectingEmitter>,
        cancel: CancellationToken,
        handle: tokio::task::JoinHandle<u64>,
    }

    fn start_sink(initial: Mode) -> Fixture {
        let (reg_tx, reg_rx) = mpsc::unbounded_channel();
        let gate = ModeGate::new(initial);
        let emitter = Arc::new(CollectingEmitter::new());
        let cancel = CancellationToken::new();
        let sink = ResultSink::new(
            reg_rx,
            gate.watch(),
            emitter.clone(),
            cancel.clone(),
        );
        let handle = tokio::spawn(sink.run());
        Fixture { reg_tx, gate, emitter, cancel, handle }
    }

    #[tokio::test]
    async fn test_forwards_results_in_multi_mode() {
        let fixture = start_sink(Mode::Multi);
        let (res_tx, res_rx) = mpsc::unbounded_channel();
        fixture.reg_tx.send((WorkerId(0), res_rx)).unwrap();

        res_tx.send(decision(1)).unwrap();
        res_tx.send(decision(2)).unwrap();

        let emitter = fixture.emitter.clone();
        wait_until(move || emitter.len() == 2).await;

        fixture.cancel.cancel();
        assert_eq!(fixture.handle.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_suspended_while_gate_engaged() {
        let fixture = start_sink(Mode::Mono);
        let (res_tx, res_rx) = mpsc::unbounded_channel();
        fixture.reg_tx.send((WorkerId(0), res_rx)).unwrap();

        for i in 0..5 {
            res_tx.send(decision(i)).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        // Gate engaged: nothing crosses the boundary.
        assert!(fixture.emitter.is_empty());

        // Disengage: every held result is delivered exactly once.
        fixture.gate.set(Mode::Multi);
        let emitter = fixture.emitter.clone();
        wait_until(move || emitter.len() == 5).await;
        assert_eq!(fixture.emitter.len(), 5);

        fixture.cancel.cancel();
        fixture.handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_reengaging_gate_suspends_again() {
        let fixture = start_sink(Mode::Multi);
        let (res_tx, res_rx) = mpsc::unbounded_channel();
        fixture.reg_tx.send((WorkerId(0), res_rx)).unwrap();

        res_tx.send(decision(1)).unwrap();
        let emitter = fixture.emitter.clone();
        wait_until(move || emitter.len() == 1).await;

        fixture.gate.set(Mode::Mono);
        tokio::time::sleep(Duration::from_millis(50)).await;
        res_tx.send(decision(2)).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fixture.emitter.len(), 1);

        fixture.gate.set(Mode::Multi);
        let emitter = fixture.emitter.clone();
        wait_until(move || emitter.len() == 2).await;

        fixture.cancel.cancel();
        fixture.handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_drain_then_stop_on_cancel() {
        let fixture = start_sink(Mode::Multi);
        let (res_tx, res_rx) = mpsc::unbounded_channel();
        fixture.reg_tx.send((WorkerId(0), res_rx)).unwrap();

        // Queue results and cancel immediately: the drain pass must
        // still deliver all of them.
        for i in 0..10 {
            res_tx.send(decision(i)).unwrap();
        }
        drop(res_tx);
        fixture.cancel.cancel();

        assert_eq!(fixture.handle.await.unwrap(), 10);
        assert_eq!(fixture.emitter.len(), 10);
    }

    #[tokio::test]
    async fn test_merges_multiple_workers() {
        let fixture = start_sink(Mode::Multi);
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        fixture.reg_tx.send((WorkerId(0), rx_a)).unwrap();
        fixture.reg_tx.send((WorkerId(1), rx_b)).unwrap();

        tx_a.send(decision(1)).unwrap();
        tx_b.send(decision(2)).unwrap();
        tx_a.send(decision(3)).unwrap();

        let emitter = fixture.emitter.clone();
        wait_until(move || emitter.len() == 3).await;

        let seen: Vec<u64> = fixture
            .emitter
            .decisions()
            .iter()
            .map(|d| d.datapath.as_u64())
            .collect();
        let mut sorted = seen.clone();
        sorted.sort_unstable();
        // No cross-worker ordering guarantee, but nothing lost or duplicated.
        assert_eq!(sorted, vec![1, 2, 3]);

        fixture.cancel.cancel();
        fixture.handle.await.unwrap();
    }
}

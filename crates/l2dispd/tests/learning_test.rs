//! End-to-end tests of the learning-switch evaluation pipeline.

use l2dispd::daemon::{Evaluation, EvaluationConfig};
use l2dispd::engine::L2Frame;
use ofdispatch_core::{CollectingEmitter, Mode};
use ofdispatch_types::{BufferId, DatapathId, MacAddress, OutputPort, PortNo};
use std::sync::Arc;

fn mac(last: u8) -> MacAddress {
    MacAddress::new([0, 0, 0, 0, 0, last])
}

fn frame(src: u8, dst: u8, in_port: u16, buffer: u32) -> L2Frame {
    L2Frame {
        datapath: DatapathId::new(1),
        src: mac(src),
        dst: mac(dst),
        in_port: PortNo::new(in_port),
        buffer_id: BufferId::new(buffer),
    }
}

fn config(workers: usize, mode: Mode) -> EvaluationConfig {
    EvaluationConfig {
        workers,
        mode,
        extra_load: 0,
        datapaths: 2,
        frame_seed: Some(7),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mono_floods_then_forwards() {
    let emitter = Arc::new(CollectingEmitter::new());
    let mut eval = Evaluation::new(config(1, Mode::Mono), emitter.clone()).unwrap();

    // X -> Y on port 1: Y unknown, flood. Y -> X on port 2: X was
    // learned from the first frame, forward to port 1.
    eval.on_frame(frame(0x0a, 0x0b, 1, 1));
    eval.on_frame(frame(0x0b, 0x0a, 2, 2));

    let decisions = emitter.decisions();
    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].action, OutputPort::Flood);
    assert_eq!(decisions[1].action, OutputPort::Port(PortNo::new(1)));
    assert_eq!(decisions[1].in_port, Some(PortNo::new(2)));

    eval.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_single_worker_learns_across_frames() {
    let emitter = Arc::new(CollectingEmitter::new());
    let mut eval = Evaluation::new(config(1, Mode::Multi), emitter.clone()).unwrap();

    eval.on_frame(frame(0x0a, 0x0b, 1, 1));
    eval.on_frame(frame(0x0b, 0x0a, 2, 2));
    eval.shutdown().await;

    // One worker sees both frames in dispatch order.
    let decisions = emitter.decisions();
    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].action, OutputPort::Flood);
    assert_eq!(decisions[1].action, OutputPort::Port(PortNo::new(1)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_worker_replicas_learn_independently() {
    let emitter = Arc::new(CollectingEmitter::new());
    let mut eval = Evaluation::new(config(2, Mode::Multi), emitter.clone()).unwrap();

    // Round-robin sends the first frame to worker 0 and the reply to
    // worker 1, which never saw X: the reply floods. This is the
    // documented divergence of per-worker forwarding replicas.
    eval.on_frame(frame(0x0a, 0x0b, 1, 1));
    eval.on_frame(frame(0x0b, 0x0a, 2, 2));
    eval.shutdown().await;

    let decisions = emitter.decisions();
    assert_eq!(decisions.len(), 2);
    let reply = decisions
        .iter()
        .find(|d| d.buffer_id == BufferId::new(2))
        .unwrap();
    assert_eq!(reply.action, OutputPort::Flood);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_injected_frames_are_all_decided() {
    let emitter = Arc::new(CollectingEmitter::new());
    let mut eval = Evaluation::new(config(3, Mode::Multi), emitter.clone()).unwrap();

    eval.inject(30);
    eval.shutdown().await;

    assert_eq!(emitter.len(), 30);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mode_flip_midstream() {
    let emitter = Arc::new(CollectingEmitter::new());
    let mut eval = Evaluation::new(config(2, Mode::Mono), emitter.clone()).unwrap();

    eval.on_frame(frame(0x0a, 0x0b, 1, 1));
    eval.set_mode(Mode::Multi);
    eval.on_frame(frame(0x0c, 0x0d, 3, 2));

    let stats = eval.stats();
    assert_eq!(stats.dispatch.inline_decided, 1);
    assert_eq!(stats.pool.dispatched, 1);

    eval.shutdown().await;
    assert_eq!(emitter.len(), 2);
}

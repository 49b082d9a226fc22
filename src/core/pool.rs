//! Worker pool: a fixed set of OS threads, spawned once and joined at
//! shutdown (persistent threads rather than a per-iteration `thread::spawn`),
//! each driving synthesize -> execute -> learn -> trend-push until the
//! termination flag fires.
//!
//! Admission into the "currently iterating" set is bounded by a counting
//! semaphore sized to the configured concurrency; acquisition is interruptible by
//! the termination flag via bounded-time wait slices.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::core::engine::Engine;
use crate::core::exec::execute;
use crate::core::learn::{update, LearningParams};
use crate::core::synth::synthesize;

const SLICE: Duration = Duration::from_millis(200);
const EMPTY_SYNTHESIS_BACKOFF: Duration = Duration::from_millis(50);

/// A counting semaphore whose `acquire` is interruptible by a termination flag,
/// woken in bounded slices rather than blocking indefinitely.
struct Semaphore {
    state: Mutex<usize>,
    condvar: Condvar,
}

impl Semaphore {
    fn new(permits: usize) -> Self {
        Semaphore {
            state: Mutex::new(permits),
            condvar: Condvar::new(),
        }
    }

    /// Blocks until a permit is available or `terminating` is observed, whichever
    /// comes first. Returns `true` if a permit was acquired.
    fn acquire_interruptible(&self, terminating: &std::sync::atomic::AtomicBool) -> bool {
        let mut guard = self.state.lock();
        loop {
            if *guard > 0 {
                *guard -= 1;
                return true;
            }
            if terminating.load(Ordering::SeqCst) {
                return false;
            }
            self.condvar.wait_for(&mut guard, SLICE);
        }
    }

    fn release(&self) {
        let mut guard = self.state.lock();
        *guard += 1;
        self.condvar.notify_one();
    }
}

/// Spawns `engine.config.workers` persistent worker threads. Returns their join
/// handles; the caller joins them after setting `engine.terminating`.
pub fn spawn_workers(engine: Arc<Engine>) -> Vec<JoinHandle<()>> {
    let semaphore = Arc::new(Semaphore::new(engine.config.workers));

    (0..engine.config.workers)
        .map(|id| {
            let engine = Arc::clone(&engine);
            let semaphore = Arc::clone(&semaphore);
            thread::Builder::new()
                .name(format!("shellgrok-worker-{id}"))
                .spawn(move || worker_loop(id, engine, semaphore))
                .expect("failed to spawn worker thread")
        })
        .collect()
}

fn worker_loop(id: usize, engine: Arc<Engine>, semaphore: Arc<Semaphore>) {
    let mut rng = StdRng::from_entropy();

    while !engine.terminating.load(Ordering::SeqCst) {
        if !semaphore.acquire_interruptible(&engine.terminating) {
            break;
        }
        run_iteration(id, &engine, &mut rng);
        semaphore.release();
    }

    tracing::debug!(worker = id, "worker exiting");
}

fn run_iteration(id: usize, engine: &Arc<Engine>, rng: &mut StdRng) {
    let command = {
        let vocab_guard = engine.vocab.lock();
        synthesize(&vocab_guard, &engine.settings, rng)
    };

    if command.is_empty() {
        thread::sleep(EMPTY_SYNTHESIS_BACKOFF);
        return;
    }

    let command_string = {
        let vocab_guard = engine.vocab.lock();
        command
            .indices
            .iter()
            .filter_map(|&idx| vocab_guard.word(idx))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let runtime = Duration::from_secs(engine.config.runtime_secs);
    let captured = match execute(
        &command_string,
        runtime,
        engine.config.kill_attempts,
        &engine.terminating,
    ) {
        Ok(out) => out,
        Err(e) => {
            tracing::debug!(worker = id, error = %e, "iteration produced no output");
            return;
        }
    };

    let params = LearningParams {
        redundancy_threshold: engine.config.redundancy_threshold,
        reward: engine.config.reward,
        penalty: engine.config.penalty,
        store_redundant: engine.config.store_redundant,
    };
    let reward = update(
        &engine.vocab,
        &engine.obs,
        &captured.bytes,
        &command.indices,
        params,
    );

    engine.trend.push(reward);

    tracing::debug!(
        worker = id,
        command = %command_string,
        bytes = captured.bytes.len(),
        reward,
        "iteration complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Instant;

    #[test]
    fn semaphore_respects_capacity() {
        let sem = Semaphore::new(1);
        let flag = AtomicBool::new(false);
        assert!(sem.acquire_interruptible(&flag));
        sem.release();
        assert!(sem.acquire_interruptible(&flag));
    }

    #[test]
    fn semaphore_acquire_is_interrupted_by_termination() {
        let sem = Semaphore::new(0);
        let flag = AtomicBool::new(false);
        let start = Instant::now();

        let acquired = std::thread::scope(|scope| {
            let handle = scope.spawn(|| sem.acquire_interruptible(&flag));
            std::thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
            handle.join().unwrap()
        });

        assert!(!acquired);
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}

//! Tuner: a single long-lived task that nudges `settings.length` from the
//! trend tracker's verdict at a fixed interval, leaving `scope` static.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::engine::Engine;
use crate::core::trend::Verdict;

/// Spawns the tuner thread. Exits once `engine.terminating` is observed.
pub fn spawn_tuner(engine: Arc<Engine>) -> JoinHandle<()> {
    let interval = Duration::from_millis(engine.config.tuner_interval_ms);
    thread::Builder::new()
        .name("shellgrok-tuner".to_string())
        .spawn(move || tuner_loop(engine, interval))
        .expect("failed to spawn tuner thread")
}

fn tuner_loop(engine: Arc<Engine>, interval: Duration) {
    while !engine.terminating.load(Ordering::SeqCst) {
        thread::sleep(interval);
        if engine.terminating.load(Ordering::SeqCst) {
            break;
        }

        match engine.trend.verdict() {
            Verdict::Up => {
                engine.settings.increment_length();
                tracing::info!(new_length = engine.settings.snapshot().0, "tuner: trend up");
            }
            Verdict::Down => {
                engine.settings.decrement_length();
                tracing::info!(new_length = engine.settings.snapshot().0, "tuner: trend down");
            }
            Verdict::Flat => {}
        }
    }

    tracing::debug!("tuner exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RuntimeConfig, CMDMAX, CMDMIN};
    use crate::core::obs::ObservationLog;
    use crate::core::vocab::Vocabulary;

    fn test_engine(interval_ms: u64) -> Arc<Engine> {
        let mut config = RuntimeConfig::default();
        config.tuner_interval_ms = interval_ms;
        config.initial_length = CMDMIN;
        config.initial_scope = 50;
        Engine::new(Vocabulary::new(), ObservationLog::new(), config)
    }

    #[test]
    fn tuner_saturates_length_at_cmdmax_on_upward_trend() {
        let engine = test_engine(10);
        for v in 1..=10i64 {
            engine.trend.push(v);
        }
        let handle = spawn_tuner(Arc::clone(&engine));
        std::thread::sleep(Duration::from_millis(300));
        engine.terminating.store(true, Ordering::SeqCst);
        handle.join().unwrap();

        assert_eq!(engine.settings.snapshot().0, CMDMAX);
    }
}

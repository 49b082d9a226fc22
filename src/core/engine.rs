//! Shared state threaded through the worker pool and tuner: the vocabulary,
//! observation log, command settings, and trend tracker, each behind its own
//! lock, locked in a fixed order (observations before vocabulary before
//! settings before trend tracker) to avoid deadlock.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{CommandSettings, RuntimeConfig};
use crate::core::obs::ObservationLog;
use crate::core::trend::TrendTracker;
use crate::core::vocab::Vocabulary;

/// All process-wide shared state for one run of the learning loop.
pub struct Engine {
    pub vocab: Mutex<Vocabulary>,
    pub obs: Mutex<ObservationLog>,
    pub settings: CommandSettings,
    pub trend: TrendTracker,
    pub terminating: Arc<AtomicBool>,
    pub config: RuntimeConfig,
}

impl Engine {
    pub fn new(vocab: Vocabulary, obs: ObservationLog, config: RuntimeConfig) -> Arc<Self> {
        let settings = CommandSettings::new(config.initial_length, config.initial_scope);
        Arc::new(Engine {
            vocab: Mutex::new(vocab),
            obs: Mutex::new(obs),
            settings,
            trend: TrendTracker::new(),
            terminating: Arc::new(AtomicBool::new(false)),
            config,
        })
    }
}

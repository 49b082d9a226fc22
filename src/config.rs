//! Runtime configuration: CLI-derived defaults plus the tuner-mutable
//! [`CommandSettings`] record.

use parking_lot::Mutex;

/// Minimum synthesized command length.
pub const CMDMIN: usize = 1;
/// Maximum synthesized command length and maximum argument-position index.
pub const CMDMAX: usize = 10;
/// Minimum sampling scope percentage.
pub const SRCHMIN: u32 = 1;
/// Maximum sampling scope percentage.
pub const SRCHMAX: u32 = 100;
/// Recommended worker-count ceiling.
pub const MAX_THREADS: usize = 8;

/// Default per-command runtime budget, in seconds.
pub const DEFAULT_RUNTIME_SECS: u64 = 10;
/// Escalation stages beyond SIGTERM before the executor gives up.
pub const DEFAULT_KILL_ATTEMPTS: u32 = 3;
/// Default redundancy threshold, percent.
pub const DEFAULT_REDUNDANCY_THRESHOLD: f64 = 75.0;
/// Default reward for a novel observation.
pub const DEFAULT_REWARD: i64 = 1;
/// Default penalty for a redundant observation.
pub const DEFAULT_PENALTY: i64 = 1;
/// Default tuner interval, milliseconds.
pub const DEFAULT_TUNER_INTERVAL_MS: u64 = 1500;
/// Trend tracker circular buffer size.
pub const TREND_WINDOW_SIZE: usize = 10;
/// Trend tracker up/flat/down epsilon.
pub const TREND_EPSILON: f64 = 0.5;

/// The tuner-mutable pair `{length, scope}` consulted by the synthesizer.
///
/// Protected by a dedicated mutex acquired after the vocabulary lock and
/// before the trend-tracker lock.
pub struct CommandSettings {
    inner: Mutex<Inner>,
}

struct Inner {
    length: usize,
    scope: u32,
}

impl CommandSettings {
    pub fn new(length: usize, scope: u32) -> Self {
        CommandSettings {
            inner: Mutex::new(Inner {
                length: length.clamp(CMDMIN, CMDMAX),
                scope: scope.clamp(SRCHMIN, SRCHMAX),
            }),
        }
    }

    /// Snapshot of the current `(length, scope)` pair.
    pub fn snapshot(&self) -> (usize, u32) {
        let inner = self.inner.lock();
        (inner.length, inner.scope)
    }

    /// `length += 1`, clamped to `[CMDMIN, CMDMAX]`. Scope is static: the
    /// tuner drives length only.
    pub fn increment_length(&self) {
        let mut inner = self.inner.lock();
        inner.length = (inner.length + 1).min(CMDMAX);
    }

    /// `length -= 1`, clamped to `[CMDMIN, CMDMAX]`.
    pub fn decrement_length(&self) {
        let mut inner = self.inner.lock();
        inner.length = inner.length.saturating_sub(1).max(CMDMIN);
    }
}

/// Full set of knobs assembled once at startup from defaults overridden by CLI
/// flags. Immutable after construction; the only runtime-mutable piece is
/// [`CommandSettings`], held separately and shared via `Arc`.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub workers: usize,
    pub initial_length: usize,
    pub initial_scope: u32,
    pub runtime_secs: u64,
    pub kill_attempts: u32,
    pub redundancy_threshold: f64,
    pub reward: i64,
    pub penalty: i64,
    pub store_redundant: bool,
    pub tuner_interval_ms: u64,
    pub vocab_path: String,
    pub assoc_path: String,
    pub obs_path: String,
    pub seed_path_override: Option<String>,
}

/// Default worker count: the number of logical CPUs, clamped into
/// `[1, MAX_THREADS]`.
fn default_worker_count() -> usize {
    num_cpus::get().clamp(1, MAX_THREADS)
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            workers: default_worker_count(),
            initial_length: CMDMIN,
            initial_scope: (SRCHMIN + SRCHMAX) / 2,
            runtime_secs: DEFAULT_RUNTIME_SECS,
            kill_attempts: DEFAULT_KILL_ATTEMPTS,
            redundancy_threshold: DEFAULT_REDUNDANCY_THRESHOLD,
            reward: DEFAULT_REWARD,
            penalty: DEFAULT_PENALTY,
            store_redundant: false,
            tuner_interval_ms: DEFAULT_TUNER_INTERVAL_MS,
            vocab_path: ".shellgrok/vocab.txt".to_string(),
            assoc_path: ".shellgrok/assoc.tsv".to_string(),
            obs_path: ".shellgrok/obs.txt".to_string(),
            seed_path_override: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_clamp_on_construction() {
        let s = CommandSettings::new(999, 0);
        assert_eq!(s.snapshot(), (CMDMAX, SRCHMIN));
    }

    #[test]
    fn increment_saturates_at_cmdmax() {
        let s = CommandSettings::new(CMDMAX, 50);
        s.increment_length();
        assert_eq!(s.snapshot().0, CMDMAX);
    }

    #[test]
    fn decrement_saturates_at_cmdmin() {
        let s = CommandSettings::new(CMDMIN, 50);
        s.decrement_length();
        assert_eq!(s.snapshot().0, CMDMIN);
    }
}

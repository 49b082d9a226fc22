//! Trend tracker: a circular buffer of recent learning values feeding a
//! cached moving average and an up/flat/down verdict for the tuner.

use parking_lot::Mutex;

use crate::config::{TREND_EPSILON, TREND_WINDOW_SIZE};

struct Inner {
    values: [f64; TREND_WINDOW_SIZE],
    cursor: usize,
    fill: usize,
    mean: f64,
}

/// Thread-safe trend tracker; every operation locks internally.
pub struct TrendTracker {
    inner: Mutex<Inner>,
}

/// Tuner verdict: whether recent learning values are trending up, flat, or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Up,
    Flat,
    Down,
}

impl TrendTracker {
    pub fn new() -> Self {
        TrendTracker {
            inner: Mutex::new(Inner {
                values: [0.0; TREND_WINDOW_SIZE],
                cursor: 0,
                fill: 0,
                mean: 0.0,
            }),
        }
    }

    /// Writes `v` at the cursor, advances it mod `W`, grows `fill` up to `W`, and
    /// recomputes the cached mean over the filled portion.
    pub fn push(&self, v: i64) {
        let mut inner = self.inner.lock();
        inner.values[inner.cursor] = v as f64;
        inner.cursor = (inner.cursor + 1) % TREND_WINDOW_SIZE;
        inner.fill = (inner.fill + 1).min(TREND_WINDOW_SIZE);

        let fill = inner.fill;
        let sum: f64 = inner.values[..fill].iter().sum();
        inner.mean = sum / fill as f64;
    }

    pub fn mean(&self) -> f64 {
        self.inner.lock().mean
    }

    /// With `n` filled samples (`n < 2` => `Flat`), splits the filled window into
    /// the most recent `ceil(n/2)` samples and the remaining prior samples,
    /// comparing their means against `epsilon = 0.5`.
    ///
    /// The circular buffer stores samples in write order modulo wraparound, so
    /// "most recent" is read by walking backward from the cursor.
    pub fn verdict(&self) -> Verdict {
        let inner = self.inner.lock();
        let n = inner.fill;
        if n < 2 {
            return Verdict::Flat;
        }

        let k = n.div_ceil(2);
        let ordered = chronological(&inner.values, inner.cursor, n);
        let recent: f64 = ordered[n - k..].iter().sum::<f64>() / k as f64;
        let prior_count = n - k;
        let prior: f64 = if prior_count == 0 {
            recent
        } else {
            ordered[..prior_count].iter().sum::<f64>() / prior_count as f64
        };

        let delta = recent - prior;
        if delta > TREND_EPSILON {
            Verdict::Up
        } else if delta < -TREND_EPSILON {
            Verdict::Down
        } else {
            Verdict::Flat
        }
    }
}

impl Default for TrendTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconstructs the `n` filled values in write (oldest-to-newest) order from the
/// raw circular buffer state.
fn chronological(values: &[f64; TREND_WINDOW_SIZE], cursor: usize, n: usize) -> Vec<f64> {
    let start = (cursor + TREND_WINDOW_SIZE - n) % TREND_WINDOW_SIZE;
    (0..n).map(|i| values[(start + i) % TREND_WINDOW_SIZE]).collect()
}

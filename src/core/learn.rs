//! Learning updater: tokenizes captured output, judges redundancy against
//! the observation log, mutates the vocabulary's association map, and returns the
//! learning value (reward or penalty) for the iteration.

use parking_lot::Mutex;

use crate::core::obs::ObservationLog;
use crate::core::similarity::judge_redundancy;
use crate::core::vocab::Vocabulary;

/// Parameters controlling reward/penalty and redundancy sensitivity.
#[derive(Debug, Clone, Copy)]
pub struct LearningParams {
    pub redundancy_threshold: f64,
    pub reward: i64,
    pub penalty: i64,
    pub store_redundant: bool,
}

/// Resolves whitespace-separated tokens in `output` to existing vocabulary
/// indices. Unresolved tokens are dropped: new words are *not* added here —
/// vocabulary growth is a collaborator responsibility of persistence-load
/// and PATH-seed only.
fn tokenize_against_vocab(output: &[u8], vocab: &Vocabulary) -> Vec<u32> {
    let text = String::from_utf8_lossy(output);
    text.split_whitespace()
        .filter_map(|tok| vocab.find(tok))
        .collect()
}

/// Runs the full update: tokenize, judge redundancy (locking `obs` before
/// `vocab`), append to the observation log per policy, reward/penalize every
/// ordered pair of argument positions in `command_indices`, and return the
/// resulting learning value.
pub fn update(
    vocab: &Mutex<Vocabulary>,
    obs: &Mutex<ObservationLog>,
    output: &[u8],
    command_indices: &[u32],
    params: LearningParams,
) -> i64 {
    let tokenized = {
        let vocab_guard = vocab.lock();
        tokenize_against_vocab(output, &vocab_guard)
    };

    let reward = if tokenized.is_empty() {
        // An empty observation line carries no redundancy signal; treat it as
        // novel (it cannot match anything already stored) without touching C.
        params.reward
    } else {
        let mut obs_guard = obs.lock();
        let verdict = judge_redundancy(&tokenized, obs_guard.lines(), params.redundancy_threshold);

        if !verdict.redundant || params.store_redundant {
            obs_guard.append(tokenized);
        }
        drop(obs_guard);

        if verdict.redundant {
            -params.penalty
        } else {
            params.reward
        }
    };

    if !command_indices.is_empty() {
        let mut vocab_guard = vocab.lock();
        for (a, &word_a) in command_indices.iter().enumerate() {
            for (b, &word_b) in command_indices.iter().enumerate() {
                if a == b {
                    continue;
                }
                if vocab_guard
                    .assoc_mut()
                    .add((word_a, a as u8, word_b, b as u8), reward)
                    .is_err()
                {
                    tracing::warn!(word_a, word_b, "association update dropped: allocation failed");
                }
            }
        }
    }

    reward
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> LearningParams {
        LearningParams {
            redundancy_threshold: 75.0,
            reward: 1,
            penalty: 1,
            store_redundant: false,
        }
    }

    #[test]
    fn novel_output_rewards_both_directions() {
        let mut v = Vocabulary::new();
        v.append("echo");
        v.append("hi");
        let vocab = Mutex::new(v);
        let obs = Mutex::new(ObservationLog::new());

        let reward = update(&vocab, &obs, b"hi\n", &[0, 1], params());
        assert_eq!(reward, 1);

        let v = vocab.lock();
        assert_eq!(v.assoc_get((0, 0, 1, 1)), 1);
        assert_eq!(v.assoc_get((1, 1, 0, 0)), 1);
        assert_eq!(obs.lock().len(), 1);
    }

    #[test]
    fn redundant_output_penalizes() {
        let mut v = Vocabulary::new();
        v.append("echo");
        v.append("hi");
        let vocab = Mutex::new(v);
        let obs = Mutex::new(ObservationLog::new());

        update(&vocab, &obs, b"hi\n", &[0, 1], params());
        let reward = update(&vocab, &obs, b"hi\n", &[0, 1], params());

        assert_eq!(reward, -1);
        let v = vocab.lock();
        assert_eq!(v.assoc_get((0, 0, 1, 1)), 0);
        assert_eq!(v.assoc_get((1, 1, 0, 0)), 0);
    }

    #[test]
    fn store_redundant_policy_keeps_duplicate_lines() {
        let mut v = Vocabulary::new();
        v.append("hi");
        let vocab = Mutex::new(v);
        let obs = Mutex::new(ObservationLog::new());

        let mut p = params();
        p.store_redundant = true;

        update(&vocab, &obs, b"hi", &[0], p);
        update(&vocab, &obs, b"hi", &[0], p);

        assert_eq!(obs.lock().len(), 2);
    }

    #[test]
    fn unresolved_tokens_are_dropped_not_added_to_vocab() {
        let v = Vocabulary::new();
        let vocab = Mutex::new(v);
        let obs = Mutex::new(ObservationLog::new());

        update(&vocab, &obs, b"brand-new-token", &[], params());

        assert_eq!(vocab.lock().num_words(), 0);
        assert!(obs.lock().is_empty());
    }
}

//! Command synthesizer: samples the vocabulary and greedy-picks arguments by
//! association score against the already-chosen prefix.

use rand::Rng;

use crate::config::{CommandSettings, CMDMAX, CMDMIN};
use crate::core::vocab::{Vocabulary, TERMINATOR};

/// A synthesized argument sequence, terminated by [`TERMINATOR`].
///
/// `0 <= len(indices) <= min(settings.length, vocabulary.num_words())`, no
/// duplicates, no out-of-range indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedCommand {
    pub indices: Vec<u32>,
}

impl SynthesizedCommand {
    /// The index sequence followed by the `-1` terminator, as stored/transmitted.
    pub fn terminated(&self) -> Vec<i32> {
        let mut out: Vec<i32> = self.indices.iter().map(|&i| i as i32).collect();
        out.push(TERMINATOR);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Synthesizes one command. Holds `vocab`'s lock for the duration (the caller is
/// expected to have already acquired it) so the vocabulary size observed at entry
/// is the size used throughout.
pub fn synthesize(vocab: &Vocabulary, settings: &CommandSettings, rng: &mut impl Rng) -> SynthesizedCommand {
    let num_words = vocab.num_words();
    if num_words == 0 {
        return SynthesizedCommand { indices: Vec::new() };
    }

    let (raw_length, scope) = settings.snapshot();
    let length = raw_length.clamp(CMDMIN, CMDMAX.min(num_words));

    let sample_size = sample_size(num_words, scope);

    // Partial Fisher-Yates: shuffle just enough of the front of the pool to expose
    // `sample_size` unique candidates.
    let mut pool: Vec<u32> = (0..num_words as u32).collect();
    for i in 0..sample_size {
        let j = rng.gen_range(i..pool.len());
        pool.swap(i, j);
    }
    let mut sample_len = sample_size;

    let mut chosen: Vec<u32> = Vec::with_capacity(length);

    // Seed: one uniformly random pick from the sample.
    let seed_pos = rng.gen_range(0..sample_len);
    chosen.push(pool[seed_pos]);
    sample_len -= 1;
    pool.swap(seed_pos, sample_len);

    while chosen.len() < length && sample_len > 0 {
        let mut best_positions: Vec<usize> = vec![0];
        let mut best_score = pair_score(vocab, pool[0], chosen.len() as u8, &chosen);
        for pos in 1..sample_len {
            let score = pair_score(vocab, pool[pos], chosen.len() as u8, &chosen);
            if score > best_score {
                best_score = score;
                best_positions.clear();
                best_positions.push(pos);
            } else if score == best_score {
                best_positions.push(pos);
            }
        }
        let winner = best_positions[rng.gen_range(0..best_positions.len())];
        chosen.push(pool[winner]);
        sample_len -= 1;
        pool.swap(winner, sample_len);
    }

    SynthesizedCommand { indices: chosen }
}

/// `round(num_words * scope / 100)`, clamped to `[1, num_words]`.
fn sample_size(num_words: usize, scope: u32) -> usize {
    let raw = (num_words as f64 * scope as f64 / 100.0).round() as i64;
    raw.clamp(1, num_words as i64) as usize
}

/// `score(w, p) = sum_j [ A.get(w,p,C[j],j) + A.get(C[j],j,w,p) ]`.
fn pair_score(vocab: &Vocabulary, candidate: u32, position: u8, chosen: &[u32]) -> i64 {
    let mut total = 0i64;
    for (j, &c) in chosen.iter().enumerate() {
        let j = j as u8;
        total += vocab.assoc_get((candidate, position, c, j));
        total += vocab.assoc_get((c, j, candidate, position));
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assoc::Key;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn empty_vocabulary_synthesizes_nothing() {
        let vocab = Vocabulary::new();
        let settings = CommandSettings::new(5, 50);
        let cmd = synthesize(&vocab, &settings, &mut rng());
        assert!(cmd.is_empty());
        assert_eq!(cmd.terminated(), vec![-1]);
    }

    #[test]
    fn length_never_exceeds_settings_or_vocab_size() {
        let mut vocab = Vocabulary::new();
        for w in ["a", "b", "c"] {
            vocab.append(w);
        }
        let settings = CommandSettings::new(10, 100);
        let mut r = rng();
        for _ in 0..50 {
            let cmd = synthesize(&vocab, &settings, &mut r);
            assert!(cmd.indices.len() <= 3);
            let unique: std::collections::HashSet<_> = cmd.indices.iter().collect();
            assert_eq!(unique.len(), cmd.indices.len(), "no duplicates");
            for &idx in &cmd.indices {
                assert!((idx as usize) < vocab.num_words());
            }
            assert_eq!(*cmd.terminated().last().unwrap(), -1);
        }
    }

    #[test]
    fn scope_zero_yields_sample_size_one() {
        assert_eq!(sample_size(100, 0), 1);
    }

    #[test]
    fn scope_full_yields_full_sample() {
        assert_eq!(sample_size(20, 100), 20);
    }

    #[test]
    fn synthesis_favors_higher_scoring_candidate() {
        let mut vocab = Vocabulary::new();
        vocab.append("true");
        vocab.append("false");
        let key_true: Key = (0, 0, 0, 0);
        let _ = key_true;
        // Bias index 1 heavily at position 0 relative to nothing chosen yet; the
        // seed pick is random, so instead verify pair_score prefers the
        // higher-associated candidate once one slot is chosen.
        vocab.assoc_mut().add((1, 1, 0, 0), 100).unwrap();
        let score_1 = pair_score(&vocab, 1, 1, &[0]);
        let score_0 = pair_score(&vocab, 0, 1, &[0]);
        assert!(score_1 > score_0);
    }
}

//! Sparse four-key association store, keyed on `(word_i, pos_i, word_k, pos_k)`.
//!
//! Open-hash map with separate chaining over a power-of-two bucket array, rehashing
//! at a 0.75 load factor. A key's positions are structurally meaningful: swapping
//! `(i, p_i)` and `(k, p_k)` changes the hash, so `A(i,p,k,q)` and `A(k,q,i,p)` land
//! in different buckets and are tracked independently.

use crate::error::AllocError;

/// One component of an association key: a word index paired with the argument
/// position it occupied.
pub type Key = (u32, u8, u32, u8);

struct Entry {
    key: Key,
    value: i64,
}

/// Sparse association map. Not internally synchronized; callers lock the owning
/// [`crate::core::vocab::Vocabulary`] for exclusive access.
pub struct AssocMap {
    buckets: Vec<Vec<Entry>>,
    len: usize,
}

const INITIAL_BUCKETS: usize = 16;
const MAX_LOAD_FACTOR: f64 = 0.75;

impl AssocMap {
    pub fn new() -> Self {
        AssocMap {
            buckets: (0..INITIAL_BUCKETS).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    /// Number of present (non-zero) entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stored value for `key`, or 0 if absent.
    pub fn get(&self, key: Key) -> i64 {
        let idx = self.bucket_index(key);
        self.buckets[idx]
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value)
            .unwrap_or(0)
    }

    /// `value[key] += delta`, deleting the entry if it returns to zero. A delta of
    /// zero is a no-op. Triggers a doubling rehash before insertion if the load
    /// factor would exceed 0.75.
    pub fn add(&mut self, key: Key, delta: i64) -> Result<(), AllocError> {
        if delta == 0 {
            return Ok(());
        }

        if self.would_overflow_load_factor() {
            self.rehash()?;
        }

        let idx = self.bucket_index(key);
        let bucket = &mut self.buckets[idx];
        if let Some(pos) = bucket.iter().position(|e| e.key == key) {
            let new_value = bucket[pos].value + delta;
            if new_value == 0 {
                bucket.remove(pos);
                self.len -= 1;
            } else {
                bucket[pos].value = new_value;
            }
        } else {
            bucket.push(Entry { key, value: delta });
            self.len += 1;
        }
        Ok(())
    }

    /// Yields every present entry exactly once, in unspecified order. No ordering
    /// or snapshot guarantee across concurrent mutation (the caller is assumed to
    /// hold the owning lock for the duration of the iteration).
    pub fn iter(&self) -> impl Iterator<Item = (Key, i64)> + '_ {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|e| (e.key, e.value)))
    }

    fn would_overflow_load_factor(&self) -> bool {
        (self.len + 1) as f64 / self.buckets.len() as f64 > MAX_LOAD_FACTOR
    }

    fn rehash(&mut self) -> Result<(), AllocError> {
        let new_count = self
            .buckets
            .len()
            .checked_mul(2)
            .ok_or(AllocError)?;
        let mut new_buckets: Vec<Vec<Entry>> = Vec::new();
        new_buckets
            .try_reserve_exact(new_count)
            .map_err(|_| AllocError)?;
        new_buckets.extend((0..new_count).map(|_| Vec::new()));

        for bucket in self.buckets.drain(..) {
            for entry in bucket {
                let idx = hash_key(entry.key) as usize & (new_count - 1);
                new_buckets[idx].push(entry);
            }
        }
        self.buckets = new_buckets;
        Ok(())
    }

    fn bucket_index(&self, key: Key) -> usize {
        hash_key(key) as usize & (self.buckets.len() - 1)
    }
}

impl Default for AssocMap {
    fn default() -> Self {
        Self::new()
    }
}

/// splitmix64-style 64-bit mix. Each of the four key components is folded in with a
/// distinct odd multiplier and round of avalanche so that permuting any two
/// components (e.g. swapping `(i,p_i)` with `(k,p_k)`) changes the result.
fn hash_key(key: (u32, u8, u32, u8)) -> u64 {
    let (i, pi, k, pk) = key;
    let mut h: u64 = 0x9E3779B97F4A7C15;
    h = mix(h ^ (i as u64).wrapping_mul(0xBF58476D1CE4E5B9));
    h = mix(h ^ (pi as u64).wrapping_mul(0x94D049BB133111EB));
    h = mix(h ^ (k as u64).wrapping_mul(0xBF58476D1CE4E5B9).wrapping_add(1));
    h = mix(h ^ (pk as u64).wrapping_mul(0x94D049BB133111EB).wrapping_add(1));
    h
}

fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_get_roundtrips() {
        let mut m = AssocMap::new();
        m.add((1, 0, 2, 1), 5).unwrap();
        assert_eq!(m.get((1, 0, 2, 1)), 5);
    }

    #[test]
    fn add_negative_delta_deletes_zeroed_entry() {
        let mut m = AssocMap::new();
        m.add((1, 0, 2, 1), 5).unwrap();
        m.add((1, 0, 2, 1), -5).unwrap();
        assert_eq!(m.get((1, 0, 2, 1)), 0);
        assert_eq!(m.iter().count(), 0);
    }

    #[test]
    fn missing_key_reads_as_zero() {
        let m = AssocMap::new();
        assert_eq!(m.get((0, 0, 0, 0)), 0);
    }

    #[test]
    fn zero_delta_is_noop() {
        let mut m = AssocMap::new();
        m.add((1, 0, 2, 1), 0).unwrap();
        assert_eq!(m.len(), 0);
    }

    #[test]
    fn swapping_key_halves_changes_the_slot() {
        let mut m = AssocMap::new();
        m.add((1, 0, 2, 1), 7).unwrap();
        // the asymmetric partner key is untouched
        assert_eq!(m.get((2, 1, 1, 0)), 0);
        assert_eq!(m.get((1, 0, 2, 1)), 7);
    }

    #[test]
    fn rehash_preserves_all_entries() {
        let mut m = AssocMap::new();
        for i in 0..500u32 {
            m.add((i, 0, i + 1, 1), i as i64 + 1).unwrap();
        }
        assert_eq!(m.len(), 500);
        for i in 0..500u32 {
            assert_eq!(m.get((i, 0, i + 1, 1)), i as i64 + 1);
        }
    }

    #[test]
    fn add_is_commutative_at_a_single_key() {
        let mut a = AssocMap::new();
        a.add((3, 2, 4, 5), 4).unwrap();
        a.add((3, 2, 4, 5), -1).unwrap();
        a.add((3, 2, 4, 5), 2).unwrap();

        let mut b = AssocMap::new();
        b.add((3, 2, 4, 5), 2).unwrap();
        b.add((3, 2, 4, 5), 4).unwrap();
        b.add((3, 2, 4, 5), -1).unwrap();

        assert_eq!(a.get((3, 2, 4, 5)), b.get((3, 2, 4, 5)));
    }
}

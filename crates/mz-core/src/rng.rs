//! Seeded pseudo-random facade used throughout the generator and AI.
//!
//! Wraps [`mz_rng::Well512`] with the NetHack-style convenience surface
//! (`rn2`, `rnd`, `one_in`, `percent`, `choose`, `shuffle`) so call sites
//! read as domain code (`rng.rn2(6)`) rather than bit-twiddling a raw
//! 32-bit stream.

use mz_rng::Well512;

#[derive(Debug, Clone)]
pub struct GameRng {
    well: Well512,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            well: Well512::new(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.well.seed()
    }

    /// A uniform random integer in `[0, n)`. Returns 0 for `n == 0`.
    pub fn rn2(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.well.next_u32() % n
    }

    /// A uniform random integer in `[1, n]`. Returns 0 for `n == 0`.
    pub fn rnd(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.rn2(n) + 1
    }

    /// A uniform random integer in `[lo, hi]` inclusive. Returns `lo` if
    /// the range is empty or inverted.
    pub fn rn_range(&mut self, lo: i64, hi: i64) -> i64 {
        if hi < lo {
            return lo;
        }
        let span = (hi - lo + 1) as u64;
        lo + (self.well.next_u64() % span) as i64
    }

    /// True with probability `1/n`.
    pub fn one_in(&mut self, n: u32) -> bool {
        n > 0 && self.rn2(n) == 0
    }

    /// True with probability `p` (clamped to `[0, 1]`).
    pub fn percent(&mut self, p: f32) -> bool {
        let p = p.clamp(0.0, 1.0);
        (self.well.next_u32() as f32 / u32::MAX as f32) < p
    }

    /// A uniform random bool.
    pub fn flip(&mut self) -> bool {
        self.well.next_u32() & 1 == 0
    }

    /// Pick a uniformly random element from a non-empty slice.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.rn2(items.len() as u32) as usize)
    }

    /// Pick a uniformly random index into `[0, len)`.
    pub fn choose_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.rn2(len as u32) as usize)
    }

    /// Fisher-Yates in-place shuffle.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        if items.len() < 2 {
            return;
        }
        for i in (1..items.len()).rev() {
            let j = self.rn2((i + 1) as u32) as usize;
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rn2_is_bounded() {
        let mut rng = GameRng::new(1);
        for _ in 0..500 {
            assert!(rng.rn2(6) < 6);
        }
    }

    #[test]
    fn rn2_of_zero_is_zero() {
        let mut rng = GameRng::new(1);
        assert_eq!(rng.rn2(0), 0);
    }

    #[test]
    fn rn_range_is_bounded_inclusive() {
        let mut rng = GameRng::new(7);
        for _ in 0..500 {
            let v = rng.rn_range(4, 8);
            assert!((4..=8).contains(&v));
        }
    }

    #[test]
    fn same_seed_reproduces_stream() {
        let mut a = GameRng::new(99);
        let mut b = GameRng::new(99);
        for _ in 0..50 {
            assert_eq!(a.rn2(100), b.rn2(100));
        }
    }

    #[test]
    fn choose_none_on_empty_slice() {
        let mut rng = GameRng::new(1);
        let empty: [i32; 0] = [];
        assert_eq!(rng.choose(&empty), None);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = GameRng::new(3);
        let mut items: Vec<i32> = (0..10).collect();
        let original = items.clone();
        rng.shuffle(&mut items);
        items.sort();
        assert_eq!(items, original);
    }
}

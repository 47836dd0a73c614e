use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Cached seeded permutation of outfit-table indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShuffleState {
    seed: u32,
    permutation: Vec<usize>,
}

impl ShuffleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Recomputes the permutation of `0..len` for `seed`.
    ///
    /// Returns `false` without doing anything when `seed` is already cached.
    /// The cache is keyed on the seed only; callers reset it when the table
    /// size changes.
    pub fn shuffle(&mut self, seed: u32, len: usize) -> bool {
        if self.seed == seed && !self.permutation.is_empty() {
            return false;
        }

        debug!("Shuffling {len} outfits with seed {seed}");
        let mut rng = StdRng::seed_from_u64(u64::from(seed));
        let mut remaining: Vec<usize> = (0..len).collect();
        self.permutation.clear();
        self.permutation.reserve(len);
        while !remaining.is_empty() {
            let drawn = rng.gen_range(0..remaining.len());
            self.permutation.push(remaining.swap_remove(drawn));
        }
        self.seed = seed;
        true
    }

    /// Outfit index at shuffle `position`, wrapping past the end.
    pub fn index_at(&mut self, position: usize, seed: u32, len: usize) -> Option<usize> {
        self.shuffle(seed, len);
        if self.permutation.is_empty() {
            return None;
        }
        Some(self.permutation[position % self.permutation.len()])
    }

    /// Shuffle position of outfit `index`.
    pub fn position_of(&mut self, index: usize, seed: u32, len: usize) -> Option<usize> {
        self.shuffle(seed, len);
        self.permutation.iter().position(|&i| i == index)
    }

    pub fn reset(&mut self) {
        self.seed = 0;
        self.permutation.clear();
    }
}

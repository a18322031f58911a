// Index draws for oracle assignment. Unpredictable to callers without the seed,
// reproducible with it: same seed + same call sequence = same indexes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub trait IndexSource: Send {
    /// Uniform draw from `0..bound`.
    fn draw(&mut self, bound: u8) -> u8;

    /// Seed the stream was started from.
    fn seed(&self) -> u64;

    /// Opaque stream position, persisted so a restored ledger continues the same stream.
    fn position(&self) -> u128;

    /// Returns the stream to an earlier `position`, undoing the draws made since.
    fn rewind(&mut self, position: u128);
}

pub struct SeededIndexSource {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeededIndexSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn resume(seed: u64, position: u128) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_word_pos(position);
        Self { seed, rng }
    }
}

impl IndexSource for SeededIndexSource {
    fn draw(&mut self, bound: u8) -> u8 {
        self.rng.gen_range(0..bound)
    }

    fn seed(&self) -> u64 {
        self.seed
    }

    fn position(&self) -> u128 {
        self.rng.get_word_pos()
    }

    fn rewind(&mut self, position: u128) {
        self.rng.set_word_pos(position);
    }
}

/// Replays a fixed list of draws (modulo the bound), then falls back to a counter.
#[derive(Debug, Default)]
pub struct ScriptedIndexSource {
    script: Vec<u8>,
    drawn: u128,
}

impl ScriptedIndexSource {
    pub fn new(script: impl IntoIterator<Item = u8>) -> Self {
        Self {
            script: script.into_iter().collect(),
            drawn: 0,
        }
    }
}

impl IndexSource for ScriptedIndexSource {
    fn draw(&mut self, bound: u8) -> u8 {
        let raw = usize::try_from(self.drawn)
            .ok()
            .and_then(|i| self.script.get(i).copied())
            .unwrap_or((self.drawn % 256) as u8);
        self.drawn += 1;
        raw % bound.max(1)
    }

    fn seed(&self) -> u64 {
        0
    }

    fn position(&self) -> u128 {
        self.drawn
    }

    fn rewind(&mut self, position: u128) {
        self.drawn = position;
    }
}

/// Three distinct indexes in `0..bound`, re-drawing on collision.
pub fn draw_distinct_indexes(source: &mut dyn IndexSource, bound: u8) -> [u8; 3] {
    let first = source.draw(bound);

    let mut second = source.draw(bound);
    while second == first {
        second = source.draw(bound);
    }

    let mut third = source.draw(bound);
    while third == first || third == second {
        third = source.draw(bound);
    }

    [first, second, third]
}

//! Six-sided die used by combat resolution

use std::collections::VecDeque;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of d6 rolls
pub trait Die: Send + Sync {
    /// Uniform roll in 1..=6
    fn roll(&mut self) -> u8;
}

/// Die backed by any `rand` generator
#[derive(Clone, Debug)]
pub struct RngDie<R> {
    rng: R,
}

impl<R: RngCore> RngDie<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDie<ChaCha8Rng> {
    /// Reproducible die
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }

    /// Seeded when `seed` is given, entropy otherwise
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl<R: RngCore + Send + Sync> Die for RngDie<R> {
    fn roll(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }
}

/// Replays a fixed sequence of faces, cycling when exhausted
#[derive(Clone, Debug)]
pub struct LoadedDie {
    faces: VecDeque<u8>,
}

impl LoadedDie {
    /// Faces outside 1..=6 are clamped into range
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        let mut faces: VecDeque<u8> = faces.into_iter().map(|f| f.clamp(1, 6)).collect();
        if faces.is_empty() {
            faces.push_back(1);
        }
        Self { faces }
    }

    pub fn always(face: u8) -> Self {
        Self::new([face])
    }
}

impl Die for LoadedDie {
    fn roll(&mut self) -> u8 {
        let face = self.faces.pop_front().unwrap_or(1);
        self.faces.push_back(face);
        face
    }
}

// Copyright (C) 2026 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Scheduling-fed randomness.
//!
//! Every scheduling call leaves a few numeric observations in an [`EntropyPool`]. Each draw from
//! the [`DeterministicRng`] first folds a weighted sum of that window into the seed and then runs
//! a 48-bit linear congruential step. Given the same initial seed and the same sequence of
//! observations and draws, the output sequence is identical.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use thiserror::Error;
use tickworld_common::tasks::{SchedulerError, Tick};

pub const DEFAULT_ENTROPY_WINDOW: usize = 16;

const SEED_BITS: u32 = 48;
const SEED_MASK: u64 = (1 << SEED_BITS) - 1;
const MULTIPLIER: u64 = 0x5_DEEC_E66D;
const ADDEND: u64 = 0xB;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RngError {
    #[error("Random bound must be positive, got {0}")]
    InvalidBound(i32),
}

impl From<RngError> for SchedulerError {
    fn from(e: RngError) -> Self {
        match e {
            RngError::InvalidBound(bound) => SchedulerError::InvalidRandomBound(bound),
        }
    }
}

/// Bounded window of recent observations. Drawing does not drain it; the oldest sample is
/// evicted once the window is full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntropyPool {
    capacity: usize,
    samples: VecDeque<u64>,
}

impl EntropyPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn from_samples(capacity: usize, samples: impl IntoIterator<Item = u64>) -> Self {
        let mut pool = Self::new(capacity);
        for sample in samples {
            pool.observe(sample);
        }
        pool
    }

    pub fn observe(&mut self, sample: u64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample & SEED_MASK);
    }

    pub fn observe_bool(&mut self, value: bool) {
        self.observe(u64::from(value));
    }

    pub fn observe_tick(&mut self, tick: Tick) {
        self.observe(tick);
    }

    pub fn observe_str(&mut self, value: &str) {
        self.observe(reduce_str(value));
    }

    pub fn samples(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sum of `sample_i * 2^(i mod 48)`, reduced to 48 bits.
    pub fn weighted_sum(&self) -> u64 {
        self.samples
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, sample)| {
                acc.wrapping_add(sample.wrapping_shl(i as u32 % SEED_BITS))
            })
            & SEED_MASK
    }
}

impl Default for EntropyPool {
    fn default() -> Self {
        Self::new(DEFAULT_ENTROPY_WINDOW)
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn reduce_str(value: &str) -> u64 {
    value
        .bytes()
        .fold(0u64, |acc, byte| splitmix64(acc ^ u64::from(byte)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeterministicRng {
    seed: u64,
}

impl DeterministicRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed: seed & SEED_MASK,
        }
    }

    /// Seed from the first 16 bytes of the SHA-256 digest of `seed`, byte `i` weighted by `2^i`.
    pub fn from_seed_string(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        let seed = digest
            .iter()
            .take(16)
            .enumerate()
            .fold(0u64, |acc, (i, byte)| acc + (u64::from(*byte) << i));
        Self::from_seed(seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `[0, bound)`, after mixing the pool into the seed.
    pub fn draw(&mut self, pool: &EntropyPool, bound: i32) -> Result<i32, RngError> {
        if bound <= 0 {
            return Err(RngError::InvalidBound(bound));
        }
        self.seed = self.seed.wrapping_add(pool.weighted_sum()) & SEED_MASK;

        if bound & bound.wrapping_neg() == bound {
            return Ok(((i64::from(bound) * i64::from(self.next(31))) >> 31) as i32);
        }

        // Reject the top partial range so every residue is equally likely.
        loop {
            let bits = self.next(31);
            let val = bits % bound;
            if bits.wrapping_sub(val).wrapping_add(bound - 1) >= 0 {
                return Ok(val);
            }
        }
    }

    fn next(&mut self, bits: u32) -> i32 {
        self.seed = self.seed.wrapping_mul(MULTIPLIER).wrapping_add(ADDEND) & SEED_MASK;
        (self.seed >> (SEED_BITS - bits)) as i32
    }
}

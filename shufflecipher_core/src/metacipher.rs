//! Metacipher rule sets and displacement parameters.
//!
//! A metacipher entry names one value to relocate each round (through its
//! `main_offset` relative to the pivot) and the secondary offsets whose
//! state values decide where it goes. Entry order is semantically
//! significant: rounds apply relocations in configuration order, so two
//! configurations with the same entries in different order produce
//! different ciphers.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ShuffleError;

/// One relocation rule: which value moves, and which neighbors steer it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaCipherEntry {
    pub main_offset: i64,
    pub secondary_offsets: Vec<i64>,
}

/// How a round turns its per-entry comparison bits into a displacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplacementMode {
    /// `(constant + bits) & mask`.
    TruncatedBinary,
    /// `constant + bits`.
    Binary,
    /// `constant`, ignoring the bits.
    Constant,
    /// Sum of the matching offset-metacipher entry's state values.
    SeparateMetaCipher,
}

/// Displacement mode plus its numeric parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplacementParams {
    pub mode: DisplacementMode,
    pub constant: i64,
    pub mask: u64,
}

impl DisplacementParams {
    pub const fn new(mode: DisplacementMode, constant: i64, mask: u64) -> Self {
        Self {
            mode,
            constant,
            mask,
        }
    }
}

impl Default for DisplacementParams {
    fn default() -> Self {
        Self {
            mode: DisplacementMode::TruncatedBinary,
            constant: 1,
            mask: 0xf,
        }
    }
}

/// Ordered list of metacipher entries with unique main offsets.
///
/// Uniqueness is enforced by construction: [`define`](Self::define)
/// replaces an existing entry with the same main offset, and the
/// validating constructors reject duplicates outright. Entries always
/// carry at least one secondary offset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetaCipherConfig {
    entries: Vec<MetaCipherEntry>,
}

impl MetaCipherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock two-entry configuration.
    pub fn standard() -> Self {
        let mut config = Self::new();
        config.define(0, &[1, 2]);
        config.define(1, &[-2, -3]);
        config
    }

    /// The stock offset configuration paired with [`standard`](Self::standard).
    pub fn standard_offsets() -> Self {
        let mut config = Self::new();
        config.define(0, &[3, 4]);
        config.define(1, &[-4, -5]);
        config
    }

    /// Builds a configuration from explicit entries.
    ///
    /// Entries with no secondary offsets are skipped, matching the
    /// [`define`](Self::define) no-op rule.
    ///
    /// # Errors
    /// Rejects repeated main offsets.
    pub fn from_entries(entries: Vec<MetaCipherEntry>) -> Result<Self, ShuffleError> {
        let mut config = Self::new();
        for entry in entries {
            if entry.secondary_offsets.is_empty() {
                continue;
            }
            if config.lookup(entry.main_offset).is_some() {
                return Err(ShuffleError::DuplicateMainOffset {
                    offset: entry.main_offset,
                });
            }
            config.entries.push(entry);
        }
        Ok(config)
    }

    /// Replaces any entry with the same `main_offset`, then appends the
    /// new one. A no-op when `offsets` is empty.
    pub fn define(&mut self, main_offset: i64, offsets: &[i64]) {
        if offsets.is_empty() {
            return;
        }
        self.remove(main_offset);
        self.entries.push(MetaCipherEntry {
            main_offset,
            secondary_offsets: offsets.to_vec(),
        });
    }

    /// Removes the entry with `main_offset`; silent when absent.
    pub fn remove(&mut self, main_offset: i64) {
        if let Some(index) = self
            .entries
            .iter()
            .position(|entry| entry.main_offset == main_offset)
        {
            self.entries.remove(index);
        }
    }

    pub fn lookup(&self, main_offset: i64) -> Option<&MetaCipherEntry> {
        self.entries
            .iter()
            .find(|entry| entry.main_offset == main_offset)
    }

    pub fn entries(&self) -> &[MetaCipherEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MetaCipherConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MetaCipherConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<MetaCipherEntry>::deserialize(deserializer)?;
        Self::from_entries(entries).map_err(D::Error::custom)
    }
}

/// Parameters for [`random_modest_config`]: main offsets fixed to 0 and 1.
#[derive(Clone, Copy, Debug)]
pub struct ModestRandomParams {
    pub num_offsets: usize,
    pub min_secondary: i64,
    pub max_secondary: i64,
}

impl Default for ModestRandomParams {
    fn default() -> Self {
        Self {
            num_offsets: 5,
            min_secondary: -6,
            max_secondary: 6,
        }
    }
}

/// Parameters for [`random_wide_config`]: extra random main offsets on top
/// of the always-included 0 and 1.
#[derive(Clone, Copy, Debug)]
pub struct WideRandomParams {
    pub extra_mains: usize,
    pub num_offsets: usize,
    pub min_main: i64,
    pub max_main: i64,
    pub min_secondary: i64,
    pub max_secondary: i64,
}

impl Default for WideRandomParams {
    fn default() -> Self {
        Self {
            extra_mains: 3,
            num_offsets: 8,
            min_main: -6,
            max_main: 6,
            min_secondary: -6,
            max_secondary: 6,
        }
    }
}

/// Draws a two-entry configuration with main offsets 0 and 1 and random
/// distinct secondary offsets.
pub fn random_modest_config<R: Rng + ?Sized>(
    params: &ModestRandomParams,
    rng: &mut R,
) -> MetaCipherConfig {
    let mut config = MetaCipherConfig::new();
    for main_offset in [0i64, 1] {
        let offsets = sample_offsets(
            params.min_secondary,
            params.max_secondary,
            params.num_offsets,
            rng,
        );
        config.define(main_offset, &offsets);
    }
    config
}

/// Draws a configuration whose main offsets are 0, 1, and `extra_mains`
/// values sampled from `[min_main, 0) ∪ [2, max_main]`.
pub fn random_wide_config<R: Rng + ?Sized>(
    params: &WideRandomParams,
    rng: &mut R,
) -> MetaCipherConfig {
    let mut mains: Vec<i64> = (params.min_main..0).chain(2..=params.max_main).collect();
    mains.shuffle(rng);
    mains.truncate(params.extra_mains);
    mains.push(0);
    mains.push(1);
    let mut config = MetaCipherConfig::new();
    for main_offset in mains {
        let offsets = sample_offsets(
            params.min_secondary,
            params.max_secondary,
            params.num_offsets,
            rng,
        );
        config.define(main_offset, &offsets);
    }
    config
}

/// Shuffles the inclusive offset pool and keeps the first `count` values,
/// clamped into `1..=pool size`. The shuffled order is kept as-is; it
/// feeds the round's bit accumulation, so it matters.
fn sample_offsets<R: Rng + ?Sized>(min: i64, max: i64, count: usize, rng: &mut R) -> Vec<i64> {
    let mut pool: Vec<i64> = (min..=max).collect();
    if pool.is_empty() {
        return pool;
    }
    pool.shuffle(rng);
    let keep = count.clamp(1, pool.len());
    pool.truncate(keep);
    pool
}

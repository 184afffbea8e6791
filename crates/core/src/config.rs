//! Configuration for the scheduling and memory-hierarchy runtime.
//!
//! A [`Config`] is built with defaults (mirroring the CLI's `--cores 2
//! --quantum 100 --policy rr` defaults) and deserialized from an optional
//! TOML/JSON file via `serde`; CLI flags then override individual fields.
//! Validation happens once, at [`Config::validate`], producing a single
//! [`SimError::ConfigError`] listing every problem found rather than
//! failing on the first one.

use serde::Deserialize;

use crate::common::SimError;

/// Default configuration constants.
mod defaults {
    /// Default number of virtual cores.
    pub const CORES: usize = 2;
    /// Default quantum (max instructions per dispatch) for preemptible policies.
    pub const QUANTUM: u32 = 100;
    /// Default per-core L1 capacity, in words.
    pub const CACHE_CAPACITY: usize = 64;
    /// Default main-memory size, in words.
    pub const MAIN_WORDS: u64 = 1 << 16;
    /// Default secondary-storage size, in words.
    pub const SECONDARY_WORDS: u64 = 1 << 18;
    /// Default cache-hit cost, in cycles.
    pub const WEIGHT_CACHE: u64 = 1;
    /// Default main-memory access cost, in cycles.
    pub const WEIGHT_PRIMARY: u64 = 10;
    /// Default secondary-storage access cost, in cycles.
    pub const WEIGHT_SECONDARY: u64 = 100;
}

/// Scheduling policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// First-Come, First-Served.
    Fcfs,
    /// Shortest Job Next.
    Sjn,
    /// Round-Robin.
    RoundRobin,
    /// Non-preemptive Priority.
    Priority,
    /// Preemptive Priority.
    PriorityPreempt,
}

impl PolicyKind {
    /// Parses the CLI's short policy names (`fcfs`, `sjn`, `rr`, `prio`,
    /// `prio_preempt`).
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConfigError`] if `s` does not match one of the
    /// five recognized names.
    pub fn parse_cli(s: &str) -> Result<Self, SimError> {
        match s {
            "fcfs" => Ok(Self::Fcfs),
            "sjn" => Ok(Self::Sjn),
            "rr" => Ok(Self::RoundRobin),
            "prio" => Ok(Self::Priority),
            "prio_preempt" => Ok(Self::PriorityPreempt),
            other => Err(SimError::ConfigError(format!(
                "unknown policy '{other}' (expected one of: fcfs, sjn, rr, prio, prio_preempt)"
            ))),
        }
    }
}

/// Replacement policy for a per-core L1 cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheReplacementPolicy {
    /// First-In, First-Out (the default).
    Fifo,
    /// Least Recently Used.
    Lru,
}

impl Default for CacheReplacementPolicy {
    fn default() -> Self {
        Self::Fifo
    }
}

/// Per-core L1 cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of words the cache can hold.
    pub capacity: usize,
    /// Victim-selection policy.
    pub policy: CacheReplacementPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::CACHE_CAPACITY,
            policy: CacheReplacementPolicy::default(),
        }
    }
}

/// Main/secondary store sizing, in machine words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Size of main memory, in words.
    pub main_words: u64,
    /// Size of secondary storage, in words.
    pub secondary_words: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            main_words: defaults::MAIN_WORDS,
            secondary_words: defaults::SECONDARY_WORDS,
        }
    }
}

/// Per-access cost weights at each memory level, in cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MemoryWeights {
    /// Cost of an L1 hit.
    pub cache: u64,
    /// Cost of a main-memory access.
    pub primary: u64,
    /// Cost of a secondary-storage access.
    pub secondary: u64,
}

impl Default for MemoryWeights {
    fn default() -> Self {
        Self {
            cache: defaults::WEIGHT_CACHE,
            primary: defaults::WEIGHT_PRIMARY,
            secondary: defaults::WEIGHT_SECONDARY,
        }
    }
}

/// Top-level simulator configuration.
///
/// Deserializable from TOML/JSON via `serde`; construct with
/// [`Config::default`] for the CLI's built-in defaults and override fields
/// (or reassign wholesale via a parsed file) before calling
/// [`Config::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of virtual cores.
    pub cores: usize,
    /// Instructions per dispatch for preemptible policies (`rr`,
    /// `prio_preempt`). `None` means unbounded — used by `--non-preemptive`
    /// and by the inherently non-preemptive policies.
    pub quantum: Option<u32>,
    /// Scheduling policy.
    pub policy: PolicyKind,
    /// Per-core L1 cache configuration.
    pub cache: CacheConfig,
    /// Main/secondary store sizing.
    pub memory: MemoryConfig,
    /// Per-access-level cost weights.
    pub weights: MemoryWeights,
    /// Advisory host-loop stop condition. `None` means unlimited.
    pub cycle_budget: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cores: defaults::CORES,
            quantum: Some(defaults::QUANTUM),
            policy: PolicyKind::RoundRobin,
            cache: CacheConfig::default(),
            memory: MemoryConfig::default(),
            weights: MemoryWeights::default(),
            cycle_budget: None,
        }
    }
}

impl Config {
    /// Total addressable words across main memory and secondary storage.
    #[must_use]
    pub fn address_space_words(&self) -> u64 {
        self.memory.main_words + self.memory.secondary_words
    }

    /// Validates the configuration, collecting every problem found into a
    /// single [`SimError::ConfigError`].
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConfigError`] if `cores` is zero, `quantum` is
    /// `Some(0)`, or both memory regions are empty.
    pub fn validate(&self) -> Result<(), SimError> {
        let mut problems = Vec::new();
        if self.cores == 0 {
            problems.push("cores must be at least 1".to_string());
        }
        if self.quantum == Some(0) {
            problems.push("quantum must be at least 1 when bounded".to_string());
        }
        if self.address_space_words() == 0 {
            problems.push("main_words + secondary_words must be at least 1".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(SimError::ConfigError(problems.join("; ")))
        }
    }
}

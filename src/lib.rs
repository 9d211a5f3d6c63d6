#![recursion_limit = "256"]
//! # Rift Ledger
//!
//! Incremental League of Legends match-history ingestion for one player, with
//! per-champion statistics derived from the accumulated history.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (ids, match index, payloads, rows, views)
//! - **fetch**: Rate-limit aware Riot API client and metadata document cache
//! - **sync**: Match discovery, row extraction and update orchestration
//! - **storage**: Filesystem state (player, match index JSON, Parquet table)
//! - **calculate**: Derived views and rune page recommendations
//! - **reference**: Rune and item name lookups
//! - **dashboard**: Application state consumed by presentation layers
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod models;
pub mod reference;
pub mod storage;
pub mod sync;

pub use models::*;

use std::time::Duration;

/// Unit suffixes accepted by [`parse_duration`], in seconds.
const DURATION_UNITS: &[(char, u64)] = &[('d', 86_400), ('h', 3_600), ('m', 60), ('s', 1)];

/// Parse a deadline such as "45m", "2h" or "1d". A bare number is seconds.
///
/// Returns `None` for malformed input and for spans too long to represent.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (digits, unit_secs) = DURATION_UNITS
        .iter()
        .find_map(|&(suffix, secs)| s.strip_suffix(suffix).map(|n| (n, secs)))
        .unwrap_or((s, 1));

    let count: u64 = digits.parse().ok()?;
    count.checked_mul(unit_secs).map(Duration::from_secs)
}

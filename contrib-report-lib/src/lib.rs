#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for contrib-report
//!
//! This library consolidates all functionality for the contrib-report tool, which summarizes
//! who contributed what to a set of GitHub repositories over a trailing window of weeks.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`facts`]: Fetching commits and pull requests from the hosting API
//! - [`rollup`]: Folding raw activity records into per-author rollups
//! - [`reports`]: Writing the workbook and console summaries

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub(crate) type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub(crate) type HashSet<T> = rustc_hash::FxHashSet<T>;

pub(crate) fn hash_map_with_capacity<K, V>(capacity: usize) -> HashMap<K, V> {
    HashMap::with_capacity_and_hasher(capacity, rustc_hash::FxBuildHasher)
}

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

#[cfg(any(debug_assertions, test))]
pub mod facts;
#[cfg(not(any(debug_assertions, test)))]
mod facts;

#[cfg(any(debug_assertions, test))]
pub mod reports;
#[cfg(not(any(debug_assertions, test)))]
mod reports;

#[cfg(any(debug_assertions, test))]
pub mod rollup;
#[cfg(not(any(debug_assertions, test)))]
mod rollup;

pub use crate::commands::{Host, run};

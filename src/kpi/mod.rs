//! KPI derivation over the loaded datasets.
//!
//! Every table is recomputed from the raw rows on each run; nothing is
//! cached or carried between runs.

pub mod derive;

pub use derive::*;

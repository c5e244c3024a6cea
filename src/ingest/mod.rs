//! Ingestion modules.
//!
//! This module turns a raw CSV upload into the canonical record batch
//! that every downstream aggregation consumes.

pub mod reader;

pub use reader::*;

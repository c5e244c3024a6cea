//! Report generation modules.
//!
//! Renders the narrative interpretation and serializes the dashboard
//! document.

pub mod generator;

pub use generator::*;

//! PROPSETTLE: Player-prop bet resolution and tiered ROI engine
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod names;
pub mod markets;
pub mod strategy;
pub mod engine;
pub mod storage;

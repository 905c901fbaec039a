//! End-to-end tests: raw records in, ledger and ROI report out.

mod common;
mod fixed_names;
mod pipeline;
mod reporting;

//! Task classification and aggregation engine for the operations dashboard.
//!
//! Rows come from a spreadsheet-backed row source ([`workflows::sheets`]) and are
//! classified, aggregated and filtered by [`workflows::dashboard`]. Fetch cycles
//! and stale-result handling live in [`workflows::refresh`].

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

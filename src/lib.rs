//! uptrail - latency chart service for uptime monitors.
//!
//! Resamples raw probe records into fixed-cadence chart series and
//! extracts the downtime zones shown over them.

pub mod chart;
pub mod clock;
pub mod config;
pub mod db;
pub mod source;
pub mod web;

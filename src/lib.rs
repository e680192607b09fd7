//! RoverWatch - search-and-rescue rover telemetry dashboard.
//!
//! Ingests sensor telemetry (GPS, obstacle distances, gas readings) from a
//! rover over HTTP, stores it in SQLite, and serves JSON/HTML views with
//! threshold-based gas analytics and simulated detection inference.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod detector;
pub mod inference;
pub mod models;
pub mod repository;
pub mod server;

//! Shelfwise Migration Library
//!
//! Command handlers for the `shelfwise-migrate` CLI. The binary (main.rs)
//! parses arguments and delegates here; handlers write their report to any
//! `Write` so they can be exercised without a terminal.

pub mod commands;

pub use commands::Workspace;

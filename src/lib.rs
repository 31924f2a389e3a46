//! # Replay
//!
//! Runs transaction simulations in an external simulator process, tracks them as asynchronous
//! jobs and flags contracts that write storage without an authorization check.

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod jobs;
pub mod security;
pub mod serde;
pub mod simulator;
pub mod types;

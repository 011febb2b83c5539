//! Command-line interface for unisync.

pub mod app;
pub mod cli;

pub use app::{execute, run};

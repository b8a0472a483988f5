//! CLI module for DealScout

pub mod app;
pub mod commands;

pub use app::DealScoutApp;
pub use commands::{Cli, Commands};

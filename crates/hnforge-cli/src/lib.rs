//! hnforge command line
//!
//! - [`cli::command`]: argument definition
//! - [`app`]: configuration to component wiring, tracing setup
//! - [`commands`]: `backfill`, `watch`, `render` and `derive`

pub mod app;
pub mod cli;
pub mod commands;

//! Scribe command-line support
//!
//! Configuration loading, logging setup and the subcommands behind the
//! `scribe` binary.

pub mod colored_logger;
pub mod commands;
pub mod config;

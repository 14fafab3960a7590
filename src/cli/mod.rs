//! CLI module for docqa
//!
//! Handles command-line argument parsing and configuration management.

pub mod args;
pub mod config;

pub use args::{Args, Commands, SearchArgs, Verbosity};
pub use config::{Config, PathsConfig};

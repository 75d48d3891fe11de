//! Command-line front end for streamgate.
//!
//! The binary in `main.rs` is the composition root; this library holds the
//! argument parser and config-file handling so they can be tested.

#![deny(unsafe_code)]

pub mod config;
pub mod parser;

pub use config::{StreamEntry, load_settings, load_streams, write_sample_config};
pub use parser::Cli;

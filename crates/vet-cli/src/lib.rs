//! vet-assist library
//!
//! Command-line front end for the veterinary answer service:
//! - `ask`: answer questions from the knowledge base
//! - `build`: produce index, content and manifest files from records
//! - `inspect`: check that an artifact triple is consistent

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, MetricArg, ModeArg};
pub use commands::{init_logging, load_settings, run_ask, run_build, run_inspect};

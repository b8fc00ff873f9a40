//! Subcommand handlers.

pub mod analyze;
pub mod artifacts;
pub mod scan;

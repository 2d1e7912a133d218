//! Subcommand implementations

pub mod analyze;
pub mod info;
pub mod lifecycle;
pub mod status;

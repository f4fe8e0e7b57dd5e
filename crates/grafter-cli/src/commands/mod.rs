//! Subcommand implementations.

pub mod fetch;
pub mod load;
pub mod run;
pub mod translate;

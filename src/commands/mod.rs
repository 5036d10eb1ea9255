//! Command implementations for the CLI
//!
//! - serve: load the artifacts and serve the quote form
//! - check: load the artifacts and print the schema report
//! - quote: compute one estimate from command-line flags

pub mod check;
pub mod quote;
pub mod serve;

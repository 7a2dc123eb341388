//! Command-line host for the family wallet

pub mod commands;

pub use commands::*;

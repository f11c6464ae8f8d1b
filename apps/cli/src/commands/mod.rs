//! Command implementations for the ModelKeep CLI.

pub mod args;
pub mod best;
pub mod list;
pub mod name;
pub mod retention;

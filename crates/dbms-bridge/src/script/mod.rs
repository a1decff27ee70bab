//! Script handling.
//!
//! - [`splitter`]: quote- and block-aware splitting of multi-statement scripts

pub mod splitter;

pub use splitter::split_statements;

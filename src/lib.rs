//! dubmerge - merges dubbed releases of the same episode into one
//! multi-language file.
//!
//! This library crate exposes the application layer for integration testing.
//! The sync engine itself lives in `dubmerge-av`.

pub mod config;
pub mod language;
pub mod processor;
pub mod scanner;
pub mod schedule;
pub mod server;
pub mod state;

//! Core domain + application logic for the file stream bot.
//!
//! This crate is framework-agnostic. Telegram and the HTTP server live in
//! adapter crates and reach Telegram through the ports defined here.

pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod links;
pub mod logging;
pub mod media;
pub mod messaging;
pub mod ports;
pub mod store;
pub mod tasks;

pub use errors::{Error, Result};

//! Harbor Client Library
//!
//! A unified client for personal media servers: one canonical media model
//! over a ticks-based legacy server and the type-routed BitHarbor API, plus
//! the catalog search-and-download workflow.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod preflight;
pub mod services;
pub mod utils;

pub use error::{Error, Result};

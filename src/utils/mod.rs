//! Utility functions.

pub mod ticks;

//! Data models.

pub mod catalog;
pub mod config;
pub mod media;

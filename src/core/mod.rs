//! Core client logic: backend selection and the catalog ingest workflow.

pub mod facade;
pub mod ingest;

pub use facade::{Backend, UnifiedClient};
pub use ingest::{CatalogIngest, CatalogService};

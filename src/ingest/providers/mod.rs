// src/ingest/providers/mod.rs
pub mod gdelt;

pub use gdelt::GdeltProvider;

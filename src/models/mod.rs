// src/models/mod.rs

//! Domain models for the paste monitor.
//!
//! This module contains the configuration document and the data structures
//! that flow between the poll loop and the delivery workers.

mod config;
mod paste;

// Re-export all public types
pub use config::{Config, KeywordConfig, NotifyConfig, ScraperConfig};
pub use paste::{MatchedPaste, Paste, PasteMetadata};

//! Output of scraped records.
//!
//! # Submodules
//!
//! - [`session`]: collects one spider run's records with its open/close lines
//! - [`json`]: writes finished sessions to dated JSON files

pub mod json;
pub mod session;

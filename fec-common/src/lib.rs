//! # FEC Pipeline Common Library
//!
//! Shared code for all pipeline stages including:
//! - FEC REST client with rate limiting, 429 backoff and both pagination styles
//! - Target configuration (`config/fec-targets.json`) and pipeline settings (TOML)
//! - Data root layout and raw partition discovery
//! - NDJSON / JSON table I/O
//! - Logging initialisation and build identification

pub mod api;
pub mod build_info;
pub mod config;
pub mod designation;
pub mod error;
pub mod layout;
pub mod logging;
pub mod ndjson;
pub mod raw;
pub mod settings;
pub mod time;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{Error, Result};

//! # Virome Common Library
//!
//! Shared code for the Virome aggregator service:
//! - Error types
//! - Configuration loading (CLI → ENV → TOML → defaults)
//! - Text utilities used when comparing and flattening upstream data
//! - Clock abstraction for time-boxed caches

pub mod config;
pub mod error;
pub mod text;
pub mod time;

pub use error::{Error, Result};

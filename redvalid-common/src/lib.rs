//! # RedValid Common Library
//!
//! Shared code for the RedValid client crates including:
//! - Bootstrap configuration (TOML, environment, command line)
//! - Event types (RedValidEvent enum) and the EventBus
//! - Common error type

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};

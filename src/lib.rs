//! Mediastrip - filmstrip preview generation and caching
//!
//! This library crate exposes the preview pipeline for integration testing.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod extract;
pub mod filmstrip;
pub mod media;
pub mod render;
pub mod scanner;

pub use error::{Error, Result};

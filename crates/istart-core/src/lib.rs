//! Core types and trait definitions for the iStart project tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends, the scoring client, and the REST layer all depend on it.

pub mod dates;
pub mod error;
pub mod log;
pub mod project;
pub mod status;
pub mod store;
pub mod user;

pub use error::{Error, Result};

//! Shared test utilities for the metar-proxy workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Sample upstream METAR payloads in each format the API returns
//! - A mock upstream server wrapping `wiremock`
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../../crates/test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures::metar, MockUpstream};
//! ```

pub mod fixtures;
pub mod upstream;

pub use upstream::MockUpstream;

/// Path of the METAR endpoint on the mock upstream.
pub const METAR_PATH: &str = "/api/data/metar";

//! HTTP request handlers for the METAR proxy.

pub mod health;
pub mod stations;

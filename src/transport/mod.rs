//! Transport layer for actionlet.
//!
//! The control protocol is HTTP-only: two POST endpoints served via axum.

pub mod http;

pub use http::{ServerConfig, serve};

//! HTTP transport: router, handlers, and server loop.

pub mod routes;
pub mod server;

pub use routes::routes;
pub use server::{ServerConfig, serve};

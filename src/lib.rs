//! actionlet: in-container runtime server for serverless Lua actions.
//!
//! One action is bound per container lifetime: `POST /init` delivers the
//! source (inline or as a base64 zip archive) and the entry-point name,
//! `POST /run` invokes the entry point once per request. The action's
//! ambient output goes to the container's real stdout, framed with an
//! end-of-activation sentinel so an external collector can delimit each
//! activation's logs; the invocation result travels on the HTTP channel.

mod error;
mod framing;
mod loader;
mod runtime;
mod store;

pub mod service;
pub mod transport;

pub use error::{ActivationError, GENERIC_ERROR_MESSAGE};
pub use framing::ACTIVATION_SENTINEL;
pub use loader::{ActionLayout, ENTRY_SOURCE_FILENAME, InitPayload};
pub use service::ActionService;
pub use store::{ActionStore, BoundAction};

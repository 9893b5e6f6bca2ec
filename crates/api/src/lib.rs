//! Pipeline proxy server library.
//!
//! Forwards browser-facing pipeline requests to the remote pipeline with
//! the server-held API key attached. Exposes config, state, error
//! handling, and routes so integration tests and the binary entrypoint
//! share them.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;

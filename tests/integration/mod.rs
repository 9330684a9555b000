//! Integration tests
//!
//! End-to-end flows over the public API: the scheduler with in-memory
//! backends, sessions over the SQLite store, and the HTTP adapters against
//! wiremock.

pub mod http_backends;
pub mod scenarios;
pub mod session_flow;

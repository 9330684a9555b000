//! Shared test support
//!
//! - fixtures: valid trips, students and an engine over in-memory backends
//! - mock_server: wiremock setups for the RPC and document adapters
//! - assertions: `assert_ok!`, `assert_err!` and roster checks

pub mod assertions;
pub mod fixtures;
pub mod mock_server;

pub use assertions::*;
pub use fixtures::*;
pub use mock_server::*;

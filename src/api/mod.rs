//! Clinic HTTP API.
//!
//! JSON endpoints for the three roles plus sign-in. Protected routes
//! run behind a session → audit → role-gate middleware stack.
//!
//! The router is composable: `clinic_router()` returns a `Router`
//! that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::clinic_router;
pub use server::{start_server, ClinicServer};
pub use types::ApiContext;

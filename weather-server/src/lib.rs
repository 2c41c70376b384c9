//! HTTP surface of the weather dashboard.
//!
//! The binary in `main.rs` wires configuration and logging around
//! [`routes::create_router`]; tests drive the router in-process.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

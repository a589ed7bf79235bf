//! # warden-server
//!
//! JSON-over-HTTP transport for the Warden access-control core.
//!
//! Every request gets a [`CallContext`](warden_core::CallContext) carrying the
//! configured request deadline and a cancellation token that fires if the client
//! goes away. Protected routes additionally require `Authorization: Bearer <token>`;
//! the parsed identity is written into the context's `operator-id` and
//! `operator-role` fields before the handler runs.

pub mod api_types;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

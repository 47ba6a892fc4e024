//! HTTP API.
//!
//! Exposes walk tracking, booking and group walk views as JSON endpoints.
//! Routes are nested under `/api/` behind a small middleware stack:
//! CORS → Cache-Control → Access log → Handler.
//!
//! The router is composable: `api_router()` returns a `Router` that can be
//! mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::{api_router, build_router};
pub use server::{start_server_on, ApiServer, ServerInfo};
pub use types::ApiContext;

//! Axum web server adapter for streamgate.
//!
//! A thin HTTP layer over [`StreamService`](streamgate_runtime::StreamService):
//! handlers translate requests into service calls and map
//! [`StreamError`](streamgate_core::StreamError) onto status codes.

#![deny(unsafe_code)]

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod sse;
pub mod state;

pub use error::HttpError;
pub use routes::create_router;
pub use server::{CorsConfig, ServerConfig, serve};
pub use state::AppState;

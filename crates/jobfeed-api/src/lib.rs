//! Authenticated query service for the job feed.
//!
//! This crate provides an Axum HTTP server that exposes the current
//! snapshot held in a [`jobfeed_core::SnapshotCache`]:
//!
//! - `GET /health` -- static liveness response
//! - `GET /jobs` -- every record of the current snapshot, with `count`
//!   and `last_updated`
//!
//! Every request must carry the shared secret in the `X-API-KEY` header.
//! All responses, including failures, use the same JSON envelope
//! ([`ApiResponse`]).
//!
//! # Architecture
//!
//! Handlers load the current snapshot `Arc` from the cache without taking
//! a lock, so a refresh in progress never delays a request and a request
//! never observes a half-published snapshot.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use auth::{API_KEY_HEADER, ApiKey};
pub use error::ApiError;
pub use response::ApiResponse;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, bind, serve};
pub use state::AppState;

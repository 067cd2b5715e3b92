//! HTTP/REST API layer.
//!
//! Axum-based REST API at `/api/v1/` with bearer or guest-cookie identity,
//! envelope response format, and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;

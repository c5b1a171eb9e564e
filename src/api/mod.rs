//! HTTP surface: the SSE transport and its router

pub mod http;
pub mod sse;

pub use http::{create_router, serve, shutdown_signal};
pub use sse::SseState;

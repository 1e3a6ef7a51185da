//! `ragchat-server` exposes plain chat and retrieval-augmented chat over HTTP.
//! Every request runs the full pipeline independently; nothing is kept
//! between requests.

pub mod protocol;
pub mod server;

pub use server::{ApiError, AppState, ServerConfig, app_router, run_server};

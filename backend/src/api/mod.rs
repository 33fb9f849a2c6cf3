//! HTTP API module.
//!
//! This module provides the HTTP server, response types and the activity feed
//! of the UMUD catalog.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{build_router, start_server, AppState};
pub use types::*;

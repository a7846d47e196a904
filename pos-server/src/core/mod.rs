//! Core Module - server configuration, state, and background tasks
//!
//! - [`Config`] - environment-driven configuration
//! - [`ServerState`] - shared handles for all services
//! - [`Server`] - HTTP server lifecycle
//! - [`BackgroundTasks`] - registry for long-running workers

pub mod config;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
pub use tasks::{BackgroundTasks, TaskKind};

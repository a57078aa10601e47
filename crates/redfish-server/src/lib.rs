//! Redfish management API server.
//!
//! - [`config`]: `AppConfig` and the file/environment loader
//! - [`bootstrap`]: startup seeding of the resource tree and accounts
//! - [`server`]: router assembly and serving
//! - [`observability`]: tracing setup

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::AppConfig;
pub use error::ServerError;
pub use server::{AppState, build_app, build_router, build_state, run};

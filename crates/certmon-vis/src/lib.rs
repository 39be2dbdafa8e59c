//! Certmon Dashboard
//!
//! Web dashboard over certificate-vote telemetry.
//!
//! # Architecture
//!
//! - **Config**: listen address and telemetry document from env and args
//! - **REST API**: round listings, authenticator history, vote routes
//! - **Frontend**: a single static page that renders the JSON views
//!
//! # Usage
//!
//! ```ignore
//! let config = VisConfig::from_env()?;
//! let server = VisServer::from_config(&config)?;
//! server.serve(config.api_addr).await?;
//! ```

mod config;
mod error;
mod server;

pub use config::{VisConfig, DEFAULT_API_ADDR};
pub use error::{Result, ServerError};
pub use server::{AppState, VisServer};

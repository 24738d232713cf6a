//! congregation_api Library
//!
//! Re-exports modules for integration testing and the server binary.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod handlers;
pub mod store;

pub use api::{build_router, AppState};
pub use config::Config;
pub use domain::{DomainError, Identity, OperationContext, Role};
pub use error::{AppError, AppResult};

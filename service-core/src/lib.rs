//! service-core: Shared infrastructure for the invoicing workspace.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod response;

pub use axum;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use validator;

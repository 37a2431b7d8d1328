pub mod client;
pub mod endpoints;
pub mod error;
pub mod health;
mod parse;
pub mod queries;
pub mod types;

pub use client::{OpnSenseClient, MAX_RETRIES};
pub use endpoints::default_endpoints;
pub use error::FetchError;
pub use health::HealthStatus;

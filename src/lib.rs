//! OPNsense Prometheus Exporter
//!
//! A Prometheus metrics exporter for OPNsense firewalls.
//!
//! # Overview
//!
//! Every scrape of the metrics endpoint runs one pass against the OPNsense REST
//! API: a system health check first, then all enabled collectors concurrently.
//! The results are rendered in Prometheus text format together with the
//! exporter's own metrics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   HTTPS + basic auth  ┌───────────────┐
//! │  OPNsense   │ ◄───────────────────► │   Exporter    │
//! │  REST API   │     JSON (gzip)       │               │
//! └─────────────┘                       │  ┌─────────┐  │      HTTP      ┌────────────┐
//!                                       │  │ Scraper │  │ ◄────────────► │ Prometheus │
//!                                       │  └─────────┘  │   /metrics     └────────────┘
//!                                       │  ┌──────────┐ │
//!                                       │  │Collectors│ │
//!                                       │  └──────────┘ │
//!                                       └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`opnsense`] - REST client, endpoint mapping and API types
//! - [`collectors`] - one collector per feature area
//! - [`scrape`] - the scrape pass
//! - [`metrics`] - meta metrics and text rendering
//! - [`server`] - HTTP server
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use opnsense_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load("config/Default.toml")?;
//!     config.opnsense.resolve_credentials()?;
//!     config.validate()?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod collectors;
pub mod config;
pub mod error;
pub mod metrics;
pub mod opnsense;
pub mod scrape;
pub mod server;

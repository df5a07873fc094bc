//! # tfc-exporter-core
//!
//! Scrape engine of the Terraform Cloud/Enterprise Prometheus exporter.
//!
//! ## Overview
//!
//! - **API client**: [`api::TerraformApi`] contract and the reqwest-backed
//!   [`api::TfeClient`] speaking JSON:API against `/api/v2`
//! - **Metric model**: descriptors, observations and the bounded per-run
//!   [`metrics::MetricSink`]
//! - **Orchestration**: organization discovery, per-scraper and
//!   per-organization fan-out, pagination and deadline handling in
//!   [`scrape`]
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tfc_exporter_core::{
//!     api::{ClientConfig, TfeClient},
//!     metrics::exposition,
//!     scrape::{Exporter, ScopeResolver, ScraperRegistry},
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TfeClient::new(&ClientConfig {
//!     token: "secret".into(),
//!     ..Default::default()
//! })?;
//! let exporter = Exporter::new(
//!     Arc::new(client),
//!     ScopeResolver::new(vec!["acme".into()]),
//!     ScraperRegistry::builtin(),
//!     20,
//! )?;
//!
//! let observations = exporter.collect(&CancellationToken::new()).await;
//! let registry = exposition::run_registry(&observations, exporter.metrics())?;
//! println!("{}", exposition::encode_text(&registry.gather())?);
//! # Ok(())
//! # }
//! ```

// Scraper isolation relies on `catch_unwind`.
#[cfg(panic = "abort")]
compile_error!("tfc-exporter-core must be built with panic = \"unwind\"");

pub mod api;
pub mod error;
pub mod metrics;
pub mod scrape;

pub use error::{Result, ScrapeError};

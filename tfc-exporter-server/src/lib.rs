//! # tfc-exporter-server
//!
//! HTTP surface of the Terraform Cloud/Enterprise exporter: configuration,
//! logging setup and the axum router serving `/metrics` and `/`.

pub mod errors;
pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;

pub mod app_state;
pub mod build_info;
pub mod config;
pub mod logfmt;
pub mod telemetry;

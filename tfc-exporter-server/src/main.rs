//! # tfc-exporter
//!
//! Prometheus exporter for Terraform Cloud/Enterprise.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tfc_exporter_core::{
    api::TfeClient,
    scrape::{Exporter, ScopeResolver, ScraperRegistry},
};
use tfc_exporter_server::{
    AppState,
    infra::{
        build_info::BuildInfo,
        config::{Args, Config, load_env_file},
        telemetry::init_tracing,
    },
    routes::create_router,
};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file_loaded =
        load_env_file().context("failed to load .env file")?;
    let config =
        Config::from_args(Args::parse()).context("invalid configuration")?;

    init_tracing(config.log_level, config.log_format);
    let build = BuildInfo::current();
    info!(
        version = build.version,
        revision = build.revision,
        branch = build.branch,
        "starting tfc-exporter"
    );
    debug!(
        user = build.build_user,
        date = build.build_date,
        profile = build.profile,
        os = build.os,
        arch = build.arch,
        "build context"
    );
    if env_file_loaded {
        info!("loaded .env file");
    }

    if config.address_overridden {
        info!(
            address = %config.client.address,
            "overwritten Terraform API address"
        );
    }
    if config.client.insecure_skip_verify {
        warn!("TLS certificate verification of the Terraform API is disabled");
    }

    let client = TfeClient::new(&config.client)
        .context("failed to create Terraform API client")?;
    let resolver = ScopeResolver::new(config.organizations.clone());
    if !resolver.is_configured() {
        info!(
            "no organizations configured, scraping every organization \
             visible to the token"
        );
    }
    let exporter = Exporter::new(
        Arc::new(client),
        resolver,
        ScraperRegistry::builtin(),
        config.page_size,
    )
    .context("failed to create exporter metrics")?;
    for scraper in exporter.scrapers().iter() {
        info!(
            scraper = scraper.name(),
            api_version = scraper.version(),
            help = scraper.help(),
            "scraper enabled"
        );
    }
    let state =
        AppState::new(exporter).context("failed to create handler metrics")?;

    let listener = TcpListener::bind(config.listen_address.as_str())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_address))?;
    match listener.local_addr() {
        Ok(address) => info!(%address, "listening"),
        Err(_) => info!(address = %config.listen_address, "listening"),
    }

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

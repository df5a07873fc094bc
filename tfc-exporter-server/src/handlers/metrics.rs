use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};
use tfc_exporter_core::metrics::exposition;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{errors::AppResult, infra::app_state::AppState};

/// Header Prometheus uses to announce its scrape timeout.
pub const SCRAPE_TIMEOUT_HEADER: &str = "x-prometheus-scrape-timeout-seconds";

/// Deadline announced by the scraper, if any. Unparsable or non-positive
/// values are logged and ignored.
pub fn scrape_timeout(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(SCRAPE_TIMEOUT_HEADER)?;
    let parsed = raw
        .to_str()
        .map_err(|err| err.to_string())
        .and_then(|value| {
            value.trim().parse::<f64>().map_err(|err| err.to_string())
        })
        .and_then(|seconds| {
            Duration::try_from_secs_f64(seconds).map_err(|err| err.to_string())
        });
    match parsed {
        Ok(timeout) if !timeout.is_zero() => Some(timeout),
        Ok(_) => {
            error!("ignoring zero scrape timeout");
            None
        }
        Err(err) => {
            error!(error = %err, "failed to parse timeout from Prometheus header");
            None
        }
    }
}

/// Cancels `cancel` after `timeout` unless it is cancelled first.
fn arm_deadline(cancel: &CancellationToken, timeout: Duration) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                debug!(?timeout, "scrape deadline reached");
                cancel.cancel();
            }
        }
    });
}

/// One scrape run per request.
///
/// Dropping the request future (client gone) cancels the run through the
/// drop guard.
pub async fn metrics_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    if let Some(timeout) = scrape_timeout(&headers) {
        arm_deadline(&cancel, timeout);
    }

    let observations = state.exporter.collect(&cancel).await;
    debug!(observations = observations.len(), "scrape finished");

    let registry =
        exposition::run_registry(&observations, state.exporter.metrics())?;
    let mut families = registry.gather();
    families.extend(state.handler_metrics.registry().gather());
    let body = exposition::encode_text(&families)?;

    Ok(([(header::CONTENT_TYPE, exposition::text_content_type())], body))
}

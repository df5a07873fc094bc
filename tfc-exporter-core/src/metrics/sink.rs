use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::Observation;
use crate::error::{Result, ScrapeError};

/// Default buffer between producers and the draining side of a run.
pub const DEFAULT_SINK_CAPACITY: usize = 64;

/// Write side of a run's observation stream.
///
/// Cheap to clone; the stream ends once every clone has been dropped.
#[derive(Debug, Clone)]
pub struct MetricSink {
    tx: mpsc::Sender<Observation>,
}

impl MetricSink {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Observation>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Push an observation, giving up with [`ScrapeError::Cancelled`] when
    /// `cancel` fires while the sink is full.
    pub async fn push(
        &self,
        cancel: &CancellationToken,
        observation: Observation,
    ) -> Result<()> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScrapeError::Cancelled),
            sent = self.tx.send(observation) => {
                sent.map_err(|_| ScrapeError::SinkClosed)
            }
        }
    }

    /// Push bookkeeping observations that must be delivered regardless of
    /// cancellation. A closed sink drops the observation.
    pub async fn emit(&self, observation: Observation) {
        if self.tx.send(observation).await.is_err() {
            tracing::debug!("metric sink closed before bookkeeping emit");
        }
    }
}

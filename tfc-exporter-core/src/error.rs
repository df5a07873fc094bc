use thiserror::Error;
use tokio::task::JoinError;

use crate::api::ApiError;

/// Failure of one unit of scrape work.
///
/// Resolution failures abort a whole run, listing/read failures abort one
/// scraper's work for one organization, and `Cancelled` marks work stopped
/// by the run's deadline or by a failing sibling.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("unable to list organizations: {0}")]
    ScopeResolution(#[source] ApiError),

    #[error("organization discovery returned no organizations")]
    NoOrganizations,

    #[error("{source}, organization={organization}")]
    OrganizationRead {
        organization: String,
        #[source]
        source: ApiError,
    },

    #[error("{source}, (organization={organization}, page={page})")]
    PageListing {
        organization: String,
        page: u32,
        #[source]
        source: ApiError,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("metric sink closed")]
    SinkClosed,

    #[error("task failed: {0}")]
    TaskFailed(String),
}

impl ScrapeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ScrapeError::Cancelled)
    }
}

impl From<JoinError> for ScrapeError {
    fn from(err: JoinError) -> Self {
        if err.is_cancelled() {
            ScrapeError::Cancelled
        } else {
            ScrapeError::TaskFailed(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

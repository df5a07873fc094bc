use std::sync::Arc;

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    api::TerraformApi,
    error::{Result, ScrapeError},
};

/// Decides which organizations a run covers.
///
/// A configured list is used verbatim. Without one, the organizations
/// visible to the token are listed once per process; concurrent first runs
/// share that single call and later runs reuse its result.
#[derive(Debug, Default)]
pub struct ScopeResolver {
    configured: Arc<[String]>,
    discovered: OnceCell<Arc<[String]>>,
}

impl ScopeResolver {
    pub fn new(configured: Vec<String>) -> Self {
        Self {
            configured: configured.into(),
            discovered: OnceCell::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.configured.is_empty()
    }

    pub async fn resolve(
        &self,
        api: &dyn TerraformApi,
        cancel: &CancellationToken,
    ) -> Result<Arc<[String]>> {
        if self.is_configured() {
            return Ok(Arc::clone(&self.configured));
        }

        let names = self
            .discovered
            .get_or_try_init(|| async {
                debug!("discovering organizations");
                let organizations = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return Err(ScrapeError::Cancelled);
                    }
                    listed = api.list_organizations() => {
                        listed.map_err(ScrapeError::ScopeResolution)?
                    }
                };
                if organizations.is_empty() {
                    return Err(ScrapeError::NoOrganizations);
                }
                let names: Arc<[String]> =
                    organizations.into_iter().map(|org| org.name).collect();
                info!(count = names.len(), "discovered organizations");
                Ok(names)
            })
            .await?;
        Ok(Arc::clone(names))
    }
}

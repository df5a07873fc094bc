use std::future::Future;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Result, ScrapeError};

/// Tasks that run to completion independently; one failure never touches
/// the others.
#[derive(Debug)]
pub struct IsolatedGroup<T> {
    tasks: JoinSet<Result<T>>,
}

impl<T: Send + 'static> Default for IsolatedGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> IsolatedGroup<T> {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
        }
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Wait for every task. Results arrive in completion order.
    pub async fn join(mut self) -> Vec<Result<T>> {
        let mut results = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            results.push(joined.unwrap_or_else(|err| Err(err.into())));
        }
        results
    }
}

/// Tasks sharing a child cancellation token: the first failure cancels the
/// rest and becomes the group's result.
#[derive(Debug)]
pub struct FailFastGroup {
    tasks: JoinSet<Result<()>>,
    cancel: CancellationToken,
}

impl FailFastGroup {
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            tasks: JoinSet::new(),
            cancel: parent.child_token(),
        }
    }

    /// Token to hand to sub-tasks. Cancelled on the first failure or when
    /// the parent is cancelled.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Wait for every task and return the first error, if any.
    ///
    /// A `Cancelled` that follows a real failure is a consequence of it and
    /// is never reported in its place.
    pub async fn wait(mut self) -> Result<()> {
        let mut first: Option<ScrapeError> = None;
        while let Some(joined) = self.tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|err| Err(err.into()));
            if let Err(err) = outcome {
                match &first {
                    None => {
                        if !err.is_cancelled() {
                            self.cancel.cancel();
                        }
                        first = Some(err);
                    }
                    Some(existing)
                        if existing.is_cancelled() && !err.is_cancelled() =>
                    {
                        self.cancel.cancel();
                        first = Some(err);
                    }
                    Some(_) => {
                        debug!(error = %err, "suppressed sibling error")
                    }
                }
            }
        }
        first.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use std::time::Duration;

    fn read_error(organization: &str) -> ScrapeError {
        ScrapeError::OrganizationRead {
            organization: organization.into(),
            source: ApiError::NotFound,
        }
    }

    #[tokio::test]
    async fn isolated_group_keeps_every_result() {
        let mut group = IsolatedGroup::new();
        group.spawn(async { Ok(1) });
        group.spawn(async { Err(read_error("b")) });
        group.spawn(async { Ok(3) });

        let results = group.join().await;
        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
    }

    #[tokio::test]
    async fn isolated_group_reports_panics() {
        let mut group: IsolatedGroup<()> = IsolatedGroup::new();
        group.spawn(async { panic!("boom") });

        let results = group.join().await;
        assert!(matches!(results[0], Err(ScrapeError::TaskFailed(_))));
    }

    #[tokio::test]
    async fn fail_fast_cancels_siblings() {
        let parent = CancellationToken::new();
        let mut group = FailFastGroup::new(&parent);

        let token = group.token();
        group.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => Err(ScrapeError::Cancelled),
                _ = tokio::time::sleep(Duration::from_secs(30)) => Ok(()),
            }
        });
        group.spawn(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err(read_error("b"))
        });

        let outcome = tokio::time::timeout(Duration::from_secs(5), group.wait())
            .await
            .expect("group finished promptly");
        assert!(matches!(
            outcome,
            Err(ScrapeError::OrganizationRead { ref organization, .. }) if organization == "b"
        ));
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn fail_fast_succeeds_when_all_succeed() {
        let mut group = FailFastGroup::new(&CancellationToken::new());
        group.spawn(async { Ok(()) });
        group.spawn(async { Ok(()) });
        assert!(group.wait().await.is_ok());
    }

    #[tokio::test]
    async fn parent_cancellation_reaches_sub_tasks() {
        let parent = CancellationToken::new();
        let mut group = FailFastGroup::new(&parent);
        let token = group.token();
        group.spawn(async move {
            token.cancelled().await;
            Err(ScrapeError::Cancelled)
        });
        parent.cancel();

        assert!(matches!(group.wait().await, Err(ScrapeError::Cancelled)));
    }
}

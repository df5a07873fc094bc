use async_trait::async_trait;
use tracing::debug;

use super::ScrapeContext;
use crate::{
    api::{ApiError, Page},
    error::{Result, ScrapeError},
    metrics::{MetricSink, Observation},
};

/// A listing endpoint scoped to one organization.
#[async_trait]
pub trait PagedListing: Send + Sync {
    type Item: Send;

    fn organization(&self) -> &str;

    async fn fetch_page(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> std::result::Result<Page<Self::Item>, ApiError>;
}

/// Position of a walk. `total_pages` is learned from the first response
/// and not re-read afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub total_pages: u32,
}

impl PageCursor {
    fn next(&mut self) -> Option<u32> {
        if self.page >= self.total_pages {
            return None;
        }
        self.page += 1;
        Some(self.page)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub pages: u32,
    pub items: usize,
}

async fn fetch<L: PagedListing + ?Sized>(
    listing: &L,
    ctx: &ScrapeContext,
    page: u32,
) -> Result<Page<L::Item>> {
    ctx.until_cancelled(listing.fetch_page(page, ctx.page_size()))
        .await?
        .map_err(|source| ScrapeError::PageListing {
            organization: listing.organization().to_string(),
            page,
            source,
        })
}

/// Walk every page of `listing`, pushing one observation per item.
///
/// Page 1 is fetched first to learn the page count, then pages are fetched
/// in order. A failing page ends the walk; observations already pushed
/// stay pushed.
pub async fn walk<L, F>(
    listing: &L,
    ctx: &ScrapeContext,
    sink: &MetricSink,
    translate: F,
) -> Result<WalkSummary>
where
    L: PagedListing + ?Sized,
    F: Fn(&L::Item) -> Observation + Send + Sync,
{
    let total_pages = fetch(listing, ctx, 1).await?.pagination.total_pages;
    let mut cursor = PageCursor {
        page: 0,
        total_pages,
    };
    debug!(
        organization = listing.organization(),
        total_pages = cursor.total_pages,
        "walking pages"
    );

    let mut summary = WalkSummary::default();
    while let Some(page) = cursor.next() {
        let Page { items, .. } = fetch(listing, ctx, page).await?;
        for item in &items {
            sink.push(ctx.cancel_token(), translate(item)).await?;
        }
        summary.pages += 1;
        summary.items += items.len();
    }
    Ok(summary)
}

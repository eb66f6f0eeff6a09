use futures_util::future::join_all;

use export_logging::{export_debug, export_info};

use crate::client::ForumClient;
use crate::{ExportError, RawPost, ThreadIdentity};

/// Pulls every page of a thread and flattens the posts in thread order.
pub struct ThreadFetcher<C> {
    client: C,
}

impl<C: ForumClient> ThreadFetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Fetches the page count, then all pages concurrently.
    ///
    /// Every page request runs to completion even when another one fails.
    /// The first failing page (by index) is reported and nothing is returned
    /// for the pages that succeeded.
    pub async fn fetch_raw_posts(
        &self,
        identity: &ThreadIdentity,
    ) -> Result<Vec<Option<RawPost>>, ExportError> {
        let pagination = self
            .client
            .pagination(&identity.base_url, &identity.id)
            .await?;
        let page_count = pagination.page_count.max(1);
        export_info!("thread {} has {} page(s)", identity.id, page_count);

        let requests = (1..=page_count)
            .map(|page| self.client.page(&identity.base_url, &identity.id, page));
        let pages = join_all(requests).await;

        let mut posts = Vec::new();
        for (page, result) in (1..=page_count).zip(pages) {
            let page_data = result?;
            export_debug!("page {} returned {} post(s)", page, page_data.posts.len());
            posts.extend(page_data.posts);
        }
        Ok(posts)
    }
}

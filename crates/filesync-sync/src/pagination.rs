//! Paginated version listing
//!
//! [`VersionPages`] walks a [`VersionQuery`] page by page. It is finite (it
//! stops after the first page without a continuation token) and restartable
//! ([`VersionPages::restart`] starts over from the first page).

use tracing::debug;

use filesync_core::domain::{PageToken, RemoteVersion, VersionQuery};
use filesync_core::ports::IRemoteStore;

use crate::{chain, SyncError};

/// Lazy sequence of listing pages for one query
pub struct VersionPages<'a> {
    store: &'a dyn IRemoteStore,
    query: VersionQuery,
    next_token: Option<PageToken>,
    exhausted: bool,
    pages_read: usize,
}

impl<'a> VersionPages<'a> {
    /// Creates a sequence positioned before the first page
    pub fn new(store: &'a dyn IRemoteStore, query: VersionQuery) -> Self {
        Self {
            store,
            query,
            next_token: None,
            exhausted: false,
            pages_read: 0,
        }
    }

    /// The query being listed
    pub fn query(&self) -> &VersionQuery {
        &self.query
    }

    /// Number of pages fetched since the last (re)start
    pub fn pages_read(&self) -> usize {
        self.pages_read
    }

    /// Rewinds to the first page
    pub fn restart(&mut self) {
        self.next_token = None;
        self.exhausted = false;
        self.pages_read = 0;
    }

    /// Fetches the next page
    ///
    /// # Returns
    /// `None` once the last page has been returned
    pub async fn next_page(&mut self) -> Result<Option<Vec<RemoteVersion>>, SyncError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self
            .store
            .list_page(&self.query, self.next_token.as_ref())
            .await
            .map_err(|e| {
                SyncError::RemoteQuery(format!("listing '{}': {}", self.query.name, chain(&e)))
            })?;

        self.pages_read += 1;
        self.exhausted = !page.has_more();
        self.next_token = page.next_page_token;

        debug!(
            name = %self.query.name,
            page = self.pages_read,
            count = page.versions.len(),
            last = self.exhausted,
            "Listed page"
        );
        Ok(Some(page.versions))
    }

    /// Drains every remaining page into one list, preserving store order
    pub async fn collect_all(&mut self) -> Result<Vec<RemoteVersion>, SyncError> {
        let mut all = Vec::new();
        while let Some(mut versions) = self.next_page().await? {
            all.append(&mut versions);
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use anyhow::Result;
    use filesync_core::domain::{RemoteId, VersionPage};
    use filesync_core::ports::NewRemoteObject;

    /// Serves fixed pages keyed by the incoming token
    struct PagedStore {
        pages: Vec<VersionPage>,
        calls: Mutex<Vec<Option<String>>>,
    }

    #[async_trait::async_trait]
    impl IRemoteStore for PagedStore {
        async fn list_page(
            &self,
            _query: &VersionQuery,
            token: Option<&PageToken>,
        ) -> Result<VersionPage> {
            let token = token.map(|t| t.as_str().to_string());
            self.calls.lock().unwrap().push(token.clone());
            let index = match token {
                None => 0,
                Some(t) => t.trim_start_matches("p").parse::<usize>()?,
            };
            self.pages
                .get(index)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no page {}", index))
        }
        async fn create(&self, _: &NewRemoteObject, _: Vec<u8>) -> Result<RemoteId> {
            unimplemented!()
        }
        async fn delete(&self, _: &RemoteId) -> Result<()> {
            unimplemented!()
        }
        async fn download(&self, _: &RemoteId) -> Result<Vec<u8>> {
            unimplemented!()
        }
        async fn find_or_create_folder(&self, _: &str) -> Result<RemoteId> {
            unimplemented!()
        }
    }

    fn version(id: &str) -> RemoteVersion {
        RemoteVersion::new(RemoteId::new(id.into()).unwrap(), "f", "2024-01-01T00:00:00Z")
    }

    fn page(ids: &[&str], next: Option<&str>) -> VersionPage {
        VersionPage {
            versions: ids.iter().map(|id| version(id)).collect(),
            next_page_token: next.map(|t| PageToken::new(t.to_string()).unwrap()),
        }
    }

    fn query() -> VersionQuery {
        VersionQuery::new("f", RemoteId::new("parent".into()).unwrap())
    }

    #[tokio::test]
    async fn collect_all_drains_every_page_in_order() {
        let store = PagedStore {
            pages: vec![
                page(&["a", "b"], Some("p1")),
                page(&["c"], Some("p2")),
                page(&["d"], None),
            ],
            calls: Mutex::new(Vec::new()),
        };

        let mut pages = VersionPages::new(&store, query());
        let all = pages.collect_all().await.unwrap();
        let ids: Vec<_> = all.iter().map(|v| v.id().as_str().to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(pages.pages_read(), 3);
        assert_eq!(
            *store.calls.lock().unwrap(),
            vec![None, Some("p1".to_string()), Some("p2".to_string())]
        );
        assert!(pages.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_listing_is_one_empty_page() {
        let store = PagedStore {
            pages: vec![VersionPage::default()],
            calls: Mutex::new(Vec::new()),
        };
        let mut pages = VersionPages::new(&store, query());
        assert_eq!(pages.next_page().await.unwrap(), Some(vec![]));
        assert!(pages.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn restart_lists_from_the_first_page_again() {
        let store = PagedStore {
            pages: vec![page(&["a"], Some("p1")), page(&["b"], None)],
            calls: Mutex::new(Vec::new()),
        };
        let mut pages = VersionPages::new(&store, query());
        assert_eq!(pages.collect_all().await.unwrap().len(), 2);

        pages.restart();
        assert_eq!(pages.collect_all().await.unwrap().len(), 2);
        assert_eq!(store.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn listing_failure_is_a_remote_query_error() {
        let store = PagedStore {
            pages: vec![page(&["a"], Some("p9"))],
            calls: Mutex::new(Vec::new()),
        };
        let err = VersionPages::new(&store, query())
            .collect_all()
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::RemoteQuery(_)));
    }
}

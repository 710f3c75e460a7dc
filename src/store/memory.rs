//! In-memory document store
//!
//! Serves a fixed set of documents per container, split into pages of a
//! configurable size. Query text is recorded, not interpreted: every query
//! against a container returns all of its documents. Failures and per-page
//! delays can be injected to exercise paging errors and cancellation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::error::{StoreError, StoreResult};
use super::{validate_resource_id, ContainerRef, DocumentStore, Page, ResultPager};

/// A query the store was asked to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedQuery {
    pub container: ContainerRef,
    pub query: String,
    pub partition_key: String,
}

/// Document store backed by in-memory documents
#[derive(Debug)]
pub struct MemoryStore {
    endpoint: String,
    containers: HashMap<ContainerRef, Vec<Vec<u8>>>,
    page_size: usize,
    fail_at_page: Option<(usize, String)>,
    page_delay: Option<Duration>,
    reachable: bool,
    issued: Mutex<Vec<IssuedQuery>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            endpoint: "memory://local".to_string(),
            containers: HashMap::new(),
            page_size: 100,
            fail_at_page: None,
            page_delay: None,
            reachable: true,
            issued: Mutex::new(Vec::new()),
        }
    }

    /// Builder method: add documents to a container (created if absent)
    pub fn with_documents<I, D>(mut self, container: ContainerRef, documents: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Vec<u8>>,
    {
        self.containers
            .entry(container)
            .or_default()
            .extend(documents.into_iter().map(Into::into));
        self
    }

    /// Builder method: add JSON values to a container
    pub fn with_values(self, container: ContainerRef, values: Vec<serde_json::Value>) -> Self {
        let documents: Vec<Vec<u8>> = values.iter().map(|v| v.to_string().into_bytes()).collect();
        self.with_documents(container, documents)
    }

    /// Builder method: documents per page (at least 1)
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Builder method: fail every query when it asks for page `index`
    pub fn fail_at_page(mut self, index: usize, message: impl Into<String>) -> Self {
        self.fail_at_page = Some((index, message.into()));
        self
    }

    /// Builder method: sleep before serving each page
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = Some(delay);
        self
    }

    /// Builder method: make `ping` fail
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Queries issued so far, oldest first
    pub fn issued_queries(&self) -> Vec<IssuedQuery> {
        self.issued
            .lock()
            .map(|issued| issued.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn query_items(
        &self,
        container: &ContainerRef,
        query: &str,
        partition_key: &str,
    ) -> StoreResult<Box<dyn ResultPager + '_>> {
        validate_resource_id("database", &container.database)?;
        validate_resource_id("container", &container.container)?;

        let documents = self.containers.get(container).ok_or_else(|| {
            StoreError::InvalidResource(format!("container {} does not exist", container))
        })?;

        if let Ok(mut issued) = self.issued.lock() {
            issued.push(IssuedQuery {
                container: container.clone(),
                query: query.to_string(),
                partition_key: partition_key.to_string(),
            });
        }

        let pages: Vec<Page> = documents
            .chunks(self.page_size)
            .map(|chunk| Page::new(chunk.to_vec()))
            .collect();

        Ok(Box::new(MemoryPager {
            pages,
            next: 0,
            fail_at_page: self.fail_at_page.clone(),
            page_delay: self.page_delay,
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.reachable {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!("{} is unreachable", self.endpoint)))
        }
    }
}

struct MemoryPager {
    pages: Vec<Page>,
    next: usize,
    fail_at_page: Option<(usize, String)>,
    page_delay: Option<Duration>,
}

#[async_trait]
impl ResultPager for MemoryPager {
    fn more(&self) -> bool {
        // An empty result still yields one (empty) page, like a real store
        self.next == 0 || self.next < self.pages.len()
    }

    async fn next_page(&mut self) -> StoreResult<Page> {
        if !self.more() {
            return Err(StoreError::Exhausted);
        }
        if let Some(delay) = self.page_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((index, message)) = &self.fail_at_page {
            if *index == self.next {
                return Err(StoreError::Api {
                    status: 503,
                    message: message.clone(),
                });
            }
        }

        let page = self.pages.get(self.next).cloned().unwrap_or_default();
        self.next += 1;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn readings() -> ContainerRef {
        ContainerRef::new("iot", "readings")
    }

    async fn drain(pager: &mut Box<dyn ResultPager + '_>) -> StoreResult<Vec<Page>> {
        let mut pages = Vec::new();
        while pager.more() {
            pages.push(pager.next_page().await?);
        }
        Ok(pages)
    }

    #[tokio::test]
    async fn test_paging() {
        let store = MemoryStore::new()
            .with_values(readings(), (0..5).map(|i| json!({"_ts": i})).collect())
            .page_size(2);

        let mut pager = store.query_items(&readings(), "select *", "dev-1").unwrap();
        let pages = drain(&mut pager).await.unwrap();

        assert_eq!(pages.iter().map(Page::len).collect::<Vec<_>>(), vec![2, 2, 1]);
        assert!(matches!(pager.next_page().await, Err(StoreError::Exhausted)));
    }

    #[tokio::test]
    async fn test_empty_container_yields_one_empty_page() {
        let store = MemoryStore::new().with_documents(readings(), Vec::<Vec<u8>>::new());
        let mut pager = store.query_items(&readings(), "select *", "").unwrap();
        let pages = drain(&mut pager).await.unwrap();
        assert_eq!(pages, vec![Page::default()]);
    }

    #[tokio::test]
    async fn test_records_queries() {
        let store = MemoryStore::new().with_documents(readings(), ["{}"]);
        let _pager = store.query_items(&readings(), "select * from docs c", "dev-7").unwrap();

        assert_eq!(
            store.issued_queries(),
            vec![IssuedQuery {
                container: readings(),
                query: "select * from docs c".to_string(),
                partition_key: "dev-7".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_unknown_container() {
        let store = MemoryStore::new();
        let result = store.query_items(&readings(), "select *", "pk");
        assert!(matches!(result.err(), Some(StoreError::InvalidResource(_))));
        assert!(store.issued_queries().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new()
            .with_values(readings(), (0..4).map(|i| json!({"_ts": i})).collect())
            .page_size(2)
            .fail_at_page(1, "throttled");

        let mut pager = store.query_items(&readings(), "select *", "pk").unwrap();
        assert_eq!(pager.next_page().await.unwrap().len(), 2);

        let err = pager.next_page().await.unwrap_err();
        assert_eq!(err.to_string(), "API error 503: throttled");
    }

    #[tokio::test]
    async fn test_ping() {
        assert!(MemoryStore::new().ping().await.is_ok());
        assert!(MemoryStore::new().unreachable().ping().await.is_err());
    }
}

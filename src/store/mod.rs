//! Document Store
//!
//! The document store is a capability: given a container, query text and a
//! partition key it hands back a pager over raw JSON documents. Nothing above
//! this module knows how pages are fetched.
//!
//! - **CosmosClient**: Azure Cosmos DB SQL API over REST
//! - **MemoryStore**: static documents, for tests and offline runs
//!
//! ## Paging contract
//!
//! ```text
//! let mut pager = store.query_items(&container, query, partition_key)?;
//! while pager.more() {
//!     let page = pager.next_page().await?;   // Page { items: Vec<Vec<u8>> }
//! }
//! ```

mod cosmos;
mod error;
mod memory;

pub use cosmos::{CosmosClient, CosmosClientOptions, API_VERSION};
pub use error::{StoreError, StoreResult};
pub use memory::{IssuedQuery, MemoryStore};

use async_trait::async_trait;

/// Address of a container inside a database
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerRef {
    pub database: String,
    pub container: String,
}

impl ContainerRef {
    pub fn new(database: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            container: container.into(),
        }
    }

    /// Resource link, e.g. `dbs/iot/colls/readings`
    pub fn link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.container)
    }
}

impl std::fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.database, self.container)
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Raw JSON documents, in store order
    pub items: Vec<Vec<u8>>,
}

impl Page {
    pub fn new(items: Vec<Vec<u8>>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Iterator over the pages of one query
#[async_trait]
pub trait ResultPager: Send {
    /// Whether another page can be fetched
    fn more(&self) -> bool;

    /// Fetch the next page
    async fn next_page(&mut self) -> StoreResult<Page>;
}

/// A document store client shared by every query of a data source
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Endpoint this client talks to
    fn endpoint(&self) -> &str;

    /// Open a pager for `query` scoped to one partition key value.
    ///
    /// Fails when the container cannot be addressed; no request is issued
    /// until the first `next_page`.
    fn query_items(
        &self,
        container: &ContainerRef,
        query: &str,
        partition_key: &str,
    ) -> StoreResult<Box<dyn ResultPager + '_>>;

    /// Verify the store is reachable with the configured credentials
    async fn ping(&self) -> StoreResult<()>;
}

/// Reject identifiers that cannot appear in a resource link
pub(crate) fn validate_resource_id(kind: &str, id: &str) -> StoreResult<()> {
    if id.is_empty() {
        return Err(StoreError::InvalidResource(format!("{} name is empty", kind)));
    }
    if id.contains(&['/', '\\', '?', '#'][..]) {
        return Err(StoreError::InvalidResource(format!(
            "{} name '{}' contains a reserved character",
            kind, id
        )));
    }
    Ok(())
}

use std::future::Future;

use crate::error::SweepResult;
use crate::types::ItemKey;

/// Position from which a page of the collection is requested.
///
/// The first request of a run carries the checkpoint (if any) in `start_after`, every following
/// request carries the continuation token returned by the previous page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub start_after: Option<ItemKey>,
    pub continuation_token: Option<String>,
}

/// One entry of a listed page, still in the collection's transport encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Encoded key of the entry. Some backends return entries without a key.
    pub raw_key: Option<String>,
}

impl RawEntry {
    pub fn new(raw_key: impl Into<String>) -> Self {
        Self {
            raw_key: Some(raw_key.into()),
        }
    }

    pub fn without_key() -> Self {
        Self { raw_key: None }
    }
}

/// A page returned by [`Collection::list_page`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub entries: Vec<RawEntry>,
    /// Token to request the next page with, `None` on the last page.
    pub next_token: Option<String>,
}

impl Page {
    /// Returns `true` if more pages follow this one.
    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }
}

/// A paginated remote collection whose items can be mutated one at a time.
///
/// Implementations must be safe to share between the producer and every mutation worker.
/// Cancellation of an in-flight call is done by dropping its future, so implementations should
/// not rely on running to completion.
pub trait Collection {
    /// Lists one page of entries starting at the position described by `request`.
    ///
    /// Keys are returned in the collection's transport encoding (URL query encoding) and in
    /// ascending order.
    fn list_page(&self, request: PageRequest) -> impl Future<Output = SweepResult<Page>> + Send;

    /// Applies the mutation to the item identified by `key`.
    fn mutate(&self, key: &ItemKey) -> impl Future<Output = SweepResult<()>> + Send;
}

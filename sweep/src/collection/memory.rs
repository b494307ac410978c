use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::collection::{Collection, Page, PageRequest, RawEntry};
use crate::error::SweepResult;
use crate::source::encode_key;
use crate::types::ItemKey;

/// Default number of entries returned per page, matching the S3 listing limit.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug)]
struct Inner {
    /// Entries ordered by their decoded key, mapped to what a listing returns for them.
    entries: BTreeMap<String, RawEntry>,
    page_size: usize,
    list_requests: Vec<PageRequest>,
    mutations: Vec<ItemKey>,
}

/// In-memory collection for tests and local runs.
///
/// Keys are kept sorted and listed in their URL query encoding, like a bucket listed with URL
/// encoding. `start_after` and continuation tokens both name the last key already returned, so
/// listings are restartable from any key. Every list request and every mutation is recorded
/// for later inspection.
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCollection {
    /// Creates a collection holding `keys` with the default page size.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::with_page_size(keys, DEFAULT_PAGE_SIZE)
    }

    /// Creates a collection holding `keys` that lists at most `page_size` entries per page.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    pub fn with_page_size<I, K>(keys: I, page_size: usize) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        assert!(page_size > 0, "page size must be positive");

        let entries = keys
            .into_iter()
            .map(|key| {
                let key = key.into();
                let entry = RawEntry::new(encode_key(&key));
                (key, entry)
            })
            .collect();

        let inner = Inner {
            entries,
            page_size,
            list_requests: Vec::new(),
            mutations: Vec::new(),
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Places a raw entry at the position of `position_key`, replacing any existing entry.
    ///
    /// Used to list keys that are not valid encodings or entries without a key at all.
    pub async fn insert_raw_entry(&self, position_key: impl Into<String>, entry: RawEntry) {
        let mut inner = self.inner.lock().await;
        inner.entries.insert(position_key.into(), entry);
    }

    /// Returns every list request received, in order.
    pub async fn list_requests(&self) -> Vec<PageRequest> {
        let inner = self.inner.lock().await;
        inner.list_requests.clone()
    }

    /// Returns every mutated key in the order the mutations were applied.
    pub async fn mutations(&self) -> Vec<ItemKey> {
        let inner = self.inner.lock().await;
        inner.mutations.clone()
    }

    /// Returns how many times each key was mutated.
    pub async fn mutation_counts(&self) -> HashMap<ItemKey, usize> {
        let inner = self.inner.lock().await;

        let mut counts = HashMap::new();
        for key in inner.mutations.iter() {
            *counts.entry(key.clone()).or_insert(0) += 1;
        }

        counts
    }

    /// Forgets recorded list requests and mutations, keeping the entries.
    pub async fn clear_history(&self) {
        let mut inner = self.inner.lock().await;
        inner.list_requests.clear();
        inner.mutations.clear();
    }
}

impl Collection for MemoryCollection {
    async fn list_page(&self, request: PageRequest) -> SweepResult<Page> {
        let mut inner = self.inner.lock().await;
        inner.list_requests.push(request.clone());

        // The token takes precedence over `start_after`, as it does on S3.
        let lower_bound = match (&request.continuation_token, &request.start_after) {
            (Some(token), _) => Bound::Excluded(token.clone()),
            (None, Some(start_after)) => Bound::Excluded(start_after.as_str().to_owned()),
            (None, None) => Bound::Unbounded,
        };

        let page_size = inner.page_size;
        let mut remaining = inner
            .entries
            .range((lower_bound, Bound::Unbounded))
            .take(page_size + 1);

        let mut entries = Vec::with_capacity(page_size);
        let mut last_position = None;
        for (position, entry) in remaining.by_ref().take(page_size) {
            entries.push(entry.clone());
            last_position = Some(position.clone());
        }

        let next_token = match remaining.next() {
            Some(_) => last_position,
            None => None,
        };

        debug!(
            entries = entries.len(),
            has_more = next_token.is_some(),
            "listed memory collection page"
        );

        Ok(Page {
            entries,
            next_token,
        })
    }

    async fn mutate(&self, key: &ItemKey) -> SweepResult<()> {
        let mut inner = self.inner.lock().await;
        inner.mutations.push(key.clone());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys_of(page: &Page) -> Vec<&str> {
        page.entries
            .iter()
            .filter_map(|entry| entry.raw_key.as_deref())
            .collect()
    }

    #[tokio::test]
    async fn pages_follow_continuation_tokens() {
        let collection = MemoryCollection::with_page_size(["c", "a", "b"], 2);

        let first = collection.list_page(PageRequest::default()).await.unwrap();
        assert_eq!(keys_of(&first), vec!["a", "b"]);
        assert!(first.has_more());

        let second = collection
            .list_page(PageRequest {
                start_after: None,
                continuation_token: first.next_token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(keys_of(&second), vec!["c"]);
        assert!(!second.has_more());

        assert_eq!(collection.list_requests().await.len(), 2);
    }

    #[tokio::test]
    async fn exactly_full_last_page_has_no_token() {
        let collection = MemoryCollection::with_page_size(["a", "b"], 2);

        let page = collection.list_page(PageRequest::default()).await.unwrap();

        assert_eq!(keys_of(&page), vec!["a", "b"]);
        assert_eq!(page.next_token, None);
    }

    #[tokio::test]
    async fn start_after_is_exclusive_and_keys_are_encoded() {
        let collection = MemoryCollection::new(["dir/a b", "dir/c", "x"]);

        let page = collection
            .list_page(PageRequest {
                start_after: Some(ItemKey::from("dir/a b")),
                continuation_token: None,
            })
            .await
            .unwrap();

        assert_eq!(keys_of(&page), vec!["dir%2Fc", "x"]);
    }

    #[tokio::test]
    async fn mutations_are_counted_per_key() {
        let collection = MemoryCollection::new(["a"]);

        collection.mutate(&ItemKey::from("a")).await.unwrap();
        collection.mutate(&ItemKey::from("a")).await.unwrap();

        let counts = collection.mutation_counts().await;
        assert_eq!(counts.get(&ItemKey::from("a")), Some(&2));

        collection.clear_history().await;
        assert!(collection.mutations().await.is_empty());
    }
}

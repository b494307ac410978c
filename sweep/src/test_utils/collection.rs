use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, Notify};

use crate::collection::{Collection, Page, PageRequest};
use crate::error::{ErrorKind, SweepResult};
use crate::test_utils::notify::TimedNotify;
use crate::types::ItemKey;
use crate::{bail, sweep_error};

/// Faults injected by a [`FaultyCollection`].
#[derive(Debug, Clone, Default)]
pub struct FaultConfig {
    /// Mutating this key fails with [`ErrorKind::MutationFailed`].
    pub fail_mutation_on: Option<ItemKey>,
    /// The n-th list request (1-based) fails with [`ErrorKind::ListingFailed`].
    pub fail_listing_on_call: Option<usize>,
    /// Mutations that do not fail never complete, until they are cancelled.
    pub hang_mutations: bool,
}

#[derive(Debug)]
struct Inner {
    list_calls: AtomicUsize,
    mutation_attempts: AtomicUsize,
    mutation_waiters: Mutex<Vec<(usize, Arc<Notify>)>>,
}

/// Wraps a collection and injects the faults described by a [`FaultConfig`].
///
/// Every mutation attempt is forwarded to the wrapped collection before any fault applies, so
/// the wrapped collection records every key a worker tried to mutate.
#[derive(Debug, Clone)]
pub struct FaultyCollection<C> {
    inner: C,
    config: FaultConfig,
    state: Arc<Inner>,
}

impl<C> FaultyCollection<C>
where
    C: Collection + Send + Sync,
{
    pub fn wrap(inner: C, config: FaultConfig) -> Self {
        Self {
            inner,
            config,
            state: Arc::new(Inner {
                list_calls: AtomicUsize::new(0),
                mutation_attempts: AtomicUsize::new(0),
                mutation_waiters: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn mutation_attempts(&self) -> usize {
        self.state.mutation_attempts.load(Ordering::SeqCst)
    }

    /// Returns a notification fired once at least `attempts` mutations were attempted.
    pub async fn notify_on_mutation_attempts(&self, attempts: usize) -> TimedNotify {
        let notify = Arc::new(Notify::new());

        let mut waiters = self.state.mutation_waiters.lock().await;
        if self.mutation_attempts() >= attempts {
            notify.notify_one();
        } else {
            waiters.push((attempts, notify.clone()));
        }

        TimedNotify::new(notify)
    }

    async fn record_mutation_attempt(&self) {
        let mut waiters = self.state.mutation_waiters.lock().await;
        let attempts = self.state.mutation_attempts.fetch_add(1, Ordering::SeqCst) + 1;

        waiters.retain(|(threshold, notify)| {
            if attempts >= *threshold {
                notify.notify_one();
                return false;
            }

            true
        });
    }
}

impl<C> Collection for FaultyCollection<C>
where
    C: Collection + Send + Sync,
{
    async fn list_page(&self, request: PageRequest) -> SweepResult<Page> {
        let call = self.state.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.config.fail_listing_on_call == Some(call) {
            bail!(
                ErrorKind::ListingFailed,
                "Injected listing failure",
                format!("list call number {call}")
            );
        }

        self.inner.list_page(request).await
    }

    async fn mutate(&self, key: &ItemKey) -> SweepResult<()> {
        self.inner.mutate(key).await?;
        self.record_mutation_attempt().await;

        if self.config.fail_mutation_on.as_ref() == Some(key) {
            return Err(sweep_error!(
                ErrorKind::MutationFailed,
                "Injected mutation failure",
                format!("key: '{key}'")
            ));
        }

        if self.config.hang_mutations {
            std::future::pending::<()>().await;
        }

        Ok(())
    }
}

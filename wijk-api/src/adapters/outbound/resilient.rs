//! Timeout and bounded-retry decorator for any [`TimeEntryStore`].

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::domain::{
    models::{NewTimeEntry, TimeEntry, TimeEntryId, TimeEntryPatch, TimeRange, WorkerId},
    ports::outbound::{StoreError, TimeEntryStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound for a single store call.
    pub timeout: Duration,
    /// Extra attempts after the first one.
    pub max_retries: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_retries: 3,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, retry_count: usize) -> Duration {
        // initial_backoff * 2^retry_count
        let factor = 1u32 << retry_count.min(16);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    /// Retried only on errors proving nothing was committed.
    Write,
}

impl Access {
    fn retries(self, err: &StoreError) -> bool {
        match self {
            Access::Read => err.is_transient(),
            Access::Write => err.is_uncommitted(),
        }
    }
}

pub struct ResilientStore<S> {
    inner: Arc<S>,
    policy: RetryPolicy,
}

impl<S: TimeEntryStore> ResilientStore<S> {
    pub fn new(inner: Arc<S>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn call<T, F, Fut>(&self, op: &'static str, access: Access, f: F) -> Result<T, StoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut retries = 0;
        loop {
            let err = match tokio::time::timeout(self.policy.timeout, f()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) if access.retries(&err) => err,
                Ok(Err(err)) => {
                    if access == Access::Write && err.is_transient() {
                        tracing::error!(op, "store write failed, outcome unknown: {}", err);
                    }
                    return Err(err);
                }
                Err(_) => {
                    let err = StoreError::Unavailable(format!(
                        "{op} timed out after {:?}",
                        self.policy.timeout
                    ));
                    if access == Access::Write {
                        tracing::error!(op, "store write timed out, not retrying");
                        return Err(err);
                    }
                    err
                }
            };

            if retries >= self.policy.max_retries {
                tracing::error!(op, retries, "all store attempts failed: {}", err);
                return Err(err);
            }

            let backoff = self.policy.backoff(retries);
            retries += 1;
            tracing::warn!(
                op,
                attempt = retries + 1,
                max_attempts = self.policy.max_retries + 1,
                "retrying store call after {:?}: {}",
                backoff,
                err
            );
            tokio::time::sleep(backoff).await;
        }
    }
}

#[async_trait]
impl<S: TimeEntryStore> TimeEntryStore for ResilientStore<S> {
    async fn create(&self, entry: &NewTimeEntry) -> Result<TimeEntry, StoreError> {
        self.call("create", Access::Write, || self.inner.create(entry))
            .await
    }

    async fn update(
        &self,
        id: TimeEntryId,
        patch: &TimeEntryPatch,
    ) -> Result<TimeEntry, StoreError> {
        self.call("update", Access::Write, || self.inner.update(id, patch))
            .await
    }

    async fn delete(&self, id: TimeEntryId) -> Result<(), StoreError> {
        self.call("delete", Access::Write, || self.inner.delete(id))
            .await
    }

    async fn get(&self, id: TimeEntryId) -> Result<Option<TimeEntry>, StoreError> {
        self.call("get", Access::Read, || self.inner.get(id)).await
    }

    async fn query(
        &self,
        worker_id: WorkerId,
        range: Option<TimeRange>,
    ) -> Result<Vec<TimeEntry>, StoreError> {
        self.call("query", Access::Read, || self.inner.query(worker_id, range))
            .await
    }

    async fn query_all(&self, range: Option<TimeRange>) -> Result<Vec<TimeEntry>, StoreError> {
        self.call("query_all", Access::Read, || self.inner.query_all(range))
            .await
    }

    async fn open_entry(&self, worker_id: WorkerId) -> Result<Option<TimeEntry>, StoreError> {
        self.call("open_entry", Access::Read, || self.inner.open_entry(worker_id))
            .await
    }

    async fn close_open(
        &self,
        worker_id: WorkerId,
        expected: TimeEntryId,
        end_time: OffsetDateTime,
    ) -> Result<TimeEntry, StoreError> {
        self.call("close_open", Access::Write, || {
            self.inner.close_open(worker_id, expected, end_time)
        })
        .await
    }

    async fn switch_open(
        &self,
        worker_id: WorkerId,
        expected: TimeEntryId,
        at: OffsetDateTime,
        next: &NewTimeEntry,
    ) -> Result<(TimeEntry, TimeEntry), StoreError> {
        self.call("switch_open", Access::Write, || {
            self.inner.switch_open(worker_id, expected, at, next)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::adapters::outbound::memory::InMemoryTimeEntryStore;
    use crate::domain::models::{Activity, ActivityDetail, ActivityKind};
    use time::macros::datetime;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(50),
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    fn entry() -> NewTimeEntry {
        NewTimeEntry::open(
            WorkerId::new(1),
            datetime!(2026-10-19 09:00 UTC),
            Activity::new(
                ActivityKind::Other,
                ActivityDetail::Description {
                    text: "inbox".to_string(),
                },
            )
            .unwrap(),
        )
    }

    /// A store whose calls never complete.
    #[derive(Default)]
    struct HangingStore {
        calls: AtomicUsize,
    }

    impl HangingStore {
        async fn hang<T>(&self) -> Result<T, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    #[async_trait]
    impl TimeEntryStore for HangingStore {
        async fn create(&self, _: &NewTimeEntry) -> Result<TimeEntry, StoreError> {
            self.hang().await
        }
        async fn update(
            &self,
            _: TimeEntryId,
            _: &TimeEntryPatch,
        ) -> Result<TimeEntry, StoreError> {
            self.hang().await
        }
        async fn delete(&self, _: TimeEntryId) -> Result<(), StoreError> {
            self.hang().await
        }
        async fn get(&self, _: TimeEntryId) -> Result<Option<TimeEntry>, StoreError> {
            self.hang().await
        }
        async fn query(
            &self,
            _: WorkerId,
            _: Option<TimeRange>,
        ) -> Result<Vec<TimeEntry>, StoreError> {
            self.hang().await
        }
        async fn query_all(&self, _: Option<TimeRange>) -> Result<Vec<TimeEntry>, StoreError> {
            self.hang().await
        }
        async fn open_entry(&self, _: WorkerId) -> Result<Option<TimeEntry>, StoreError> {
            self.hang().await
        }
        async fn close_open(
            &self,
            _: WorkerId,
            _: TimeEntryId,
            _: OffsetDateTime,
        ) -> Result<TimeEntry, StoreError> {
            self.hang().await
        }
        async fn switch_open(
            &self,
            _: WorkerId,
            _: TimeEntryId,
            _: OffsetDateTime,
            _: &NewTimeEntry,
        ) -> Result<(TimeEntry, TimeEntry), StoreError> {
            self.hang().await
        }
    }

    /// Commits every `create`, then reports the first one as lost.
    struct LostAckStore {
        inner: InMemoryTimeEntryStore,
        creates: AtomicUsize,
    }

    #[async_trait]
    impl TimeEntryStore for LostAckStore {
        async fn create(&self, entry: &NewTimeEntry) -> Result<TimeEntry, StoreError> {
            let created = self.inner.create(entry).await?;
            if self.creates.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
            Ok(created)
        }
        async fn update(
            &self,
            id: TimeEntryId,
            patch: &TimeEntryPatch,
        ) -> Result<TimeEntry, StoreError> {
            self.inner.update(id, patch).await
        }
        async fn delete(&self, id: TimeEntryId) -> Result<(), StoreError> {
            self.inner.delete(id).await
        }
        async fn get(&self, id: TimeEntryId) -> Result<Option<TimeEntry>, StoreError> {
            self.inner.get(id).await
        }
        async fn query(
            &self,
            worker_id: WorkerId,
            range: Option<TimeRange>,
        ) -> Result<Vec<TimeEntry>, StoreError> {
            self.inner.query(worker_id, range).await
        }
        async fn query_all(&self, range: Option<TimeRange>) -> Result<Vec<TimeEntry>, StoreError> {
            self.inner.query_all(range).await
        }
        async fn open_entry(&self, worker_id: WorkerId) -> Result<Option<TimeEntry>, StoreError> {
            self.inner.open_entry(worker_id).await
        }
        async fn close_open(
            &self,
            worker_id: WorkerId,
            expected: TimeEntryId,
            end_time: OffsetDateTime,
        ) -> Result<TimeEntry, StoreError> {
            self.inner.close_open(worker_id, expected, end_time).await
        }
        async fn switch_open(
            &self,
            worker_id: WorkerId,
            expected: TimeEntryId,
            at: OffsetDateTime,
            next: &NewTimeEntry,
        ) -> Result<(TimeEntry, TimeEntry), StoreError> {
            self.inner.switch_open(worker_id, expected, at, next).await
        }
    }

    #[tokio::test]
    async fn transient_read_failures_are_retried() {
        let inner = Arc::new(InMemoryTimeEntryStore::new());
        let store = ResilientStore::new(inner.clone(), policy());
        let created = store.create(&entry()).await.unwrap();

        inner.fail_next(2);

        assert_eq!(store.get(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn busy_writes_are_retried() {
        let inner = Arc::new(InMemoryTimeEntryStore::new());
        let store = ResilientStore::new(inner.clone(), policy());

        inner.busy_next(2);
        let created = store.create(&entry()).await.unwrap();

        assert_eq!(store.get(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn writes_with_unknown_outcome_are_not_retried() {
        let inner = Arc::new(LostAckStore {
            inner: InMemoryTimeEntryStore::new(),
            creates: AtomicUsize::new(0),
        });
        let store = ResilientStore::new(inner.clone(), policy());

        let err = store.create(&entry()).await.unwrap_err();

        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(inner.creates.load(Ordering::SeqCst), 1);
        assert!(store.open_entry(WorkerId::new(1)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let inner = Arc::new(InMemoryTimeEntryStore::new());
        let store = ResilientStore::new(inner.clone(), policy());

        inner.fail_next(10);
        let err = store.open_entry(WorkerId::new(1)).await.unwrap_err();

        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn domain_rejections_are_not_retried() {
        let inner = Arc::new(InMemoryTimeEntryStore::new());
        let store = ResilientStore::new(inner, policy());

        store.create(&entry()).await.unwrap();
        let err = store.create(&entry()).await.unwrap_err();

        assert_eq!(err, StoreError::OpenEntryExists);
    }

    #[tokio::test]
    async fn read_timeouts_are_retried_write_timeouts_are_not() {
        let inner = Arc::new(HangingStore::default());
        let store = ResilientStore::new(inner.clone(), policy());

        let read = store.open_entry(WorkerId::new(1)).await.unwrap_err();
        assert!(matches!(read, StoreError::Unavailable(_)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 4);

        inner.calls.store(0, Ordering::SeqCst);
        let write = store.create(&entry()).await.unwrap_err();
        assert!(matches!(write, StoreError::Unavailable(_)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(30),
            ..RetryPolicy::default()
        };

        assert_eq!(policy.backoff(0), Duration::from_millis(10));
        assert_eq!(policy.backoff(1), Duration::from_millis(20));
        assert_eq!(policy.backoff(2), Duration::from_millis(30));
    }
}

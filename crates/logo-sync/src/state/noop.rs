//! No-op staging store for dry runs without a staging database.
//!
//! Writes are accepted and dropped, nothing is ever pending, and queue ids
//! are handed out from a counter so the pipelines still see distinct rows.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tracing::warn;

use super::{EntityKind, LogLevel, QueueItem, StagingStore, SyncStatus};
use crate::error::Result;

pub struct NoOpStagingStore {
    warned: AtomicBool,
    next_id: AtomicI64,
}

impl NoOpStagingStore {
    pub fn new() -> Self {
        Self {
            warned: AtomicBool::new(false),
            next_id: AtomicI64::new(1),
        }
    }

    fn warn_once(&self) {
        if !self.warned.swap(true, Ordering::SeqCst) {
            warn!(
                "Using no-op staging store: queue and log rows will not be persisted. \
                 Cash and cheque receipts imported in this mode are never delivered."
            );
        }
    }
}

impl Default for NoOpStagingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StagingStore for NoOpStagingStore {
    async fn init_schema(&self) -> Result<()> {
        self.warn_once();
        Ok(())
    }

    async fn enqueue(&self, _kind: EntityKind, _entity_id: &str, _payload: &str) -> Result<i64> {
        self.warn_once();
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn pending(&self, _kind: EntityKind, _limit: usize) -> Result<Vec<QueueItem>> {
        Ok(Vec::new())
    }

    async fn update_status(
        &self,
        _id: i64,
        _status: SyncStatus,
        _error: Option<&str>,
        _reference: Option<&str>,
    ) -> Result<()> {
        Ok(())
    }

    async fn log(
        &self,
        _queue_id: Option<i64>,
        _level: LogLevel,
        _message: &str,
        _request: Option<&str>,
        _response: Option<&str>,
    ) -> Result<()> {
        Ok(())
    }

    async fn payment_plan_for_customer(&self, _customer_code: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_accepts_writes_and_has_no_work() {
        let store = NoOpStagingStore::new();
        store.init_schema().await.unwrap();

        let a = store.enqueue(EntityKind::Order, "S001", "{}").await.unwrap();
        let b = store.enqueue(EntityKind::Order, "S002", "{}").await.unwrap();
        assert_ne!(a, b);

        assert!(store.pending(EntityKind::CashReceipt, 10).await.unwrap().is_empty());
        store
            .update_status(a, SyncStatus::Success, None, Some("42"))
            .await
            .unwrap();
        store
            .log(None, LogLevel::Info, "batch", None, None)
            .await
            .unwrap();
        assert_eq!(store.payment_plan_for_customer("C1").await.unwrap(), None);
        assert_eq!(store.backend_type(), "noop");
    }
}

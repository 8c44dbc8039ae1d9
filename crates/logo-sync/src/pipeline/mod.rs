//! Batch pipelines: one per record kind moved into J-Platform.
//!
//! Every pipeline follows the same shape: read a batch, map each record to
//! its slip, queue it, [`deliver`] it, write back to PUNTO on success. The
//! pipelines differ only in where records come from and what happens after a
//! successful post.
//!
//! - [`import_receipts`]: PUNTO collections into the staging queue
//! - [`sync_receipts`]: queued cash and cheque receipts to J-Platform
//! - [`sync_orders`]: PUNTO orders to sales orders
//! - [`sync_pos`]: virtual POS collections to customer account slips
//! - [`sync_invoices`]: unbilled dispatch lines to wholesale invoices

mod import;
mod invoice;
mod order;
mod pos;
mod receipts;

#[cfg(test)]
pub(crate) mod testing;

pub use import::import_receipts;
pub use invoice::sync_invoices;
pub use order::sync_orders;
pub use pos::sync_pos;
pub use receipts::sync_receipts;

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::jplatform::{SlipApi, SlipReceipt};
use crate::mapping::SalespersonMap;
use crate::source::SourceReader;
use crate::state::{EntityKind, LogLevel, StagingStore, SyncStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Everything a pipeline needs, shared across cycles.
#[derive(Clone)]
pub struct PipelineContext {
    pub source: Arc<dyn SourceReader>,
    pub staging: Arc<dyn StagingStore>,
    pub api: Arc<dyn SlipApi>,
    pub config: Arc<Config>,
    pub salespeople: SalespersonMap,
    clock: fn() -> NaiveDateTime,
}

impl PipelineContext {
    pub fn new(
        source: Arc<dyn SourceReader>,
        staging: Arc<dyn StagingStore>,
        api: Arc<dyn SlipApi>,
        config: Arc<Config>,
    ) -> Self {
        let salespeople = SalespersonMap::new(&config.salesperson_mapping);
        Self {
            source,
            staging,
            api,
            config,
            salespeople,
            clock: local_now,
        }
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub(crate) fn offset(&self) -> &str {
        &self.config.jplatform.utc_offset
    }
}

/// Local wall-clock time; J-Platform dates carry the configured offset.
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub fn failure(&mut self) {
        self.attempted += 1;
        self.failed += 1;
    }
}

/// Outcome of posting one queued record.
#[derive(Debug)]
pub enum Delivery {
    Delivered(SlipReceipt),
    Rejected(SyncError),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered(_))
    }
}

/// Post one queued record and record the outcome on its queue row.
///
/// API failures come back as [`Delivery::Rejected`]; only staging writes
/// make this return `Err`.
pub(crate) async fn deliver<F>(
    staging: &dyn StagingStore,
    queue_id: i64,
    kind: EntityKind,
    request_json: &str,
    call: F,
) -> Result<Delivery>
where
    F: Future<Output = Result<SlipReceipt>>,
{
    let label = kind.label();
    staging
        .update_status(queue_id, SyncStatus::Processing, None, None)
        .await?;

    info!("Sending {} to J-Platform (queue id {})", label, queue_id);
    debug!("Request: {}", request_json);
    staging
        .log(
            Some(queue_id),
            LogLevel::Info,
            &format!("Sending {} to J-Platform", label),
            Some(request_json),
            None,
        )
        .await?;

    match call.await {
        Ok(receipt) => {
            let reference = receipt.reference();
            staging
                .update_status(queue_id, SyncStatus::Success, None, reference.as_deref())
                .await?;
            let message = format!(
                "{} Success. TransactionNo: {}",
                label,
                reference.as_deref().unwrap_or("-")
            );
            info!("{}", message);
            staging
                .log(
                    Some(queue_id),
                    LogLevel::Info,
                    &message,
                    None,
                    Some(&receipt.body),
                )
                .await?;
            Ok(Delivery::Delivered(receipt))
        }
        Err(e) => {
            let text = e.to_string();
            error!("{} failed (queue id {}): {}", label, queue_id, text);
            staging
                .update_status(queue_id, SyncStatus::Failed, Some(&text), None)
                .await?;
            staging
                .log(
                    Some(queue_id),
                    LogLevel::Error,
                    &format!("{} Error: {}", label, text),
                    None,
                    e.response_body(),
                )
                .await?;
            Ok(Delivery::Rejected(e))
        }
    }
}

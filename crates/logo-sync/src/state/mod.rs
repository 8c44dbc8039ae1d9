//! Staging store: the sync queue and sync log in the staging database.
//!
//! The [`StagingStore`] trait decouples the pipelines from where queue state
//! lives. Implementations:
//!
//! - **MSSQL**: [`MssqlStagingStore`] in `mssql.rs` (`JPL_SyncQueue`, `JPL_SyncLog`)
//! - **No-op**: [`NoOpStagingStore`] in `noop.rs`, for dry runs
//!
//! The pipelines work with `Arc<dyn StagingStore>` without knowing the
//! concrete type.

mod mssql;
mod noop;

pub use mssql::MssqlStagingStore;
pub use noop::NoOpStagingStore;

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Queue row status, stored as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    Pending = 0,
    Processing = 1,
    Success = 2,
    Failed = 3,
}

impl SyncStatus {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Result<Self> {
        match value {
            0 => Ok(SyncStatus::Pending),
            1 => Ok(SyncStatus::Processing),
            2 => Ok(SyncStatus::Success),
            3 => Ok(SyncStatus::Failed),
            _ => Err(SyncError::State(format!("Invalid sync status: {}", value))),
        }
    }
}

/// Helper function to convert SyncStatus to string representation.
pub fn status_to_str(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Pending => "pending",
        SyncStatus::Processing => "processing",
        SyncStatus::Success => "success",
        SyncStatus::Failed => "failed",
    }
}

/// Helper function to parse SyncStatus from string.
pub fn str_to_status(s: &str) -> Result<SyncStatus> {
    match s {
        "pending" => Ok(SyncStatus::Pending),
        "processing" => Ok(SyncStatus::Processing),
        "success" => Ok(SyncStatus::Success),
        "failed" => Ok(SyncStatus::Failed),
        _ => Err(SyncError::State(format!("Invalid sync status: {}", s))),
    }
}

/// The record family a queue row belongs to. Stored in `EntityType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    CashReceipt,
    ChequeReceipt,
    Order,
    SanalPos,
    SalesInvoice,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::CashReceipt => "CashReceipt",
            EntityKind::ChequeReceipt => "ChequeReceipt",
            EntityKind::Order => "Order",
            EntityKind::SanalPos => "SanalPos",
            EntityKind::SalesInvoice => "SalesInvoice",
        }
    }

    /// Human label used in log lines ("Cash receipt batch complete").
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::CashReceipt => "Cash receipt",
            EntityKind::ChequeReceipt => "Cheque receipt",
            EntityKind::Order => "Order",
            EntityKind::SanalPos => "Virtual POS",
            EntityKind::SalesInvoice => "Sales invoice",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CashReceipt" => Ok(EntityKind::CashReceipt),
            "ChequeReceipt" => Ok(EntityKind::ChequeReceipt),
            "Order" => Ok(EntityKind::Order),
            "SanalPos" => Ok(EntityKind::SanalPos),
            "SalesInvoice" => Ok(EntityKind::SalesInvoice),
            _ => Err(SyncError::State(format!("Unknown entity type: {}", s))),
        }
    }
}

/// Severity of a `JPL_SyncLog` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// One `JPL_SyncQueue` row.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub id: i64,
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub operation_type: String,
    pub payload: Option<String>,
    pub retry_count: i32,
}

/// Persistence for the sync queue and sync log.
///
/// Implementations must be `Send + Sync` to allow sharing across async tasks.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Create the queue and log tables. Safe to call repeatedly.
    async fn init_schema(&self) -> Result<()>;

    /// Insert or reset the queue row for `(kind, entity_id)` as Pending with
    /// `payload`. Re-enqueueing bumps the retry count. Returns the queue id.
    async fn enqueue(&self, kind: EntityKind, entity_id: &str, payload: &str) -> Result<i64>;

    /// Up to `limit` Pending rows of `kind`, oldest first.
    async fn pending(&self, kind: EntityKind, limit: usize) -> Result<Vec<QueueItem>>;

    /// Record the outcome of a delivery attempt.
    async fn update_status(
        &self,
        id: i64,
        status: SyncStatus,
        error: Option<&str>,
        reference: Option<&str>,
    ) -> Result<()>;

    /// Append a row to the sync log. `queue_id` is `None` for batch summaries.
    async fn log(
        &self,
        queue_id: Option<i64>,
        level: LogLevel,
        message: &str,
        request: Option<&str>,
        response: Option<&str>,
    ) -> Result<()>;

    /// Customer payment plan code from the configured stored procedure.
    async fn payment_plan_for_customer(&self, customer_code: &str) -> Result<Option<String>>;

    /// Round trip to the store.
    async fn ping(&self) -> Result<()>;

    /// Get the backend type name for logging/debugging.
    fn backend_type(&self) -> &'static str;
}

//! # logo-sync
//!
//! Moves sales-side records from the PUNTO distribution database into Logo
//! J-Platform over its REST API.
//!
//! Each cycle runs up to six pipelines:
//!
//! - **Receipt import**: PUNTO cash and cheque collections into the staging queue
//! - **Cash / cheque receipts**: queued collections posted as safe deposit and cheque slips
//! - **Orders**: PUNTO orders posted as sales orders
//! - **Virtual POS**: card collections posted as customer account slips
//! - **Sales invoices**: open dispatches billed as one wholesale invoice per customer
//!
//! Every posted record gets a row in the staging `JPL_SyncQueue` with its
//! status and J-Platform reference, plus request and response rows in
//! `JPL_SyncLog`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use logo_sync::{Config, SyncWorker};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> logo_sync::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let worker = SyncWorker::connect(config).await?;
//!     let result = worker.run_cycle(&CancellationToken::new()).await;
//!     println!("Posted {} records", result.total_succeeded());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod jplatform;
pub mod mapping;
pub mod pipeline;
pub mod slips;
pub mod source;
pub mod state;
pub mod worker;

// Re-exports for convenient access
pub use config::Config;
pub use error::{Result, SyncError};
pub use jplatform::{JplatformClient, SlipApi, SlipReceipt};
pub use pipeline::{BatchStats, PipelineContext};
pub use source::{MssqlPool, PuntoReader, SourceReader};
pub use state::{EntityKind, MssqlStagingStore, NoOpStagingStore, StagingStore, SyncStatus};
pub use worker::{CycleResult, HealthCheckResult, PipelineReport, SyncWorker};

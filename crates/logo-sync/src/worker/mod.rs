//! The long-running sync worker.
//!
//! [`SyncWorker`] owns the pipeline context and runs the enabled pipelines
//! once per cycle, sleeping `sync.interval_seconds` in between. A failing
//! pipeline is logged and reported; it never stops the cycle or the loop.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::{Config, ModulesConfig};
use crate::error::Result;
use crate::jplatform::{JplatformClient, SlipApi};
use crate::pipeline::{self, BatchStats, PipelineContext};
use crate::source::{MssqlPool, PuntoReader, SourceReader};
use crate::state::{EntityKind, MssqlStagingStore, NoOpStagingStore, StagingStore};

/// One pipeline of a cycle, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Import,
    Cash,
    Cheque,
    Order,
    Pos,
    Invoice,
}

impl Step {
    const ALL: [Step; 6] = [
        Step::Import,
        Step::Cash,
        Step::Cheque,
        Step::Order,
        Step::Pos,
        Step::Invoice,
    ];

    fn name(self) -> &'static str {
        match self {
            Step::Import => "import_receipts",
            Step::Cash => "cash_receipt",
            Step::Cheque => "cheque_receipt",
            Step::Order => "order",
            Step::Pos => "sanal_pos",
            Step::Invoice => "sales_invoice",
        }
    }

    fn enabled(self, modules: &ModulesConfig) -> bool {
        match self {
            Step::Import => modules.import_receipts,
            Step::Cash => modules.cash_receipt,
            Step::Cheque => modules.cheque_receipt,
            Step::Order => modules.order,
            Step::Pos => modules.sanal_pos,
            Step::Invoice => modules.sales_invoice,
        }
    }
}

/// Outcome of one pipeline within a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub name: String,
    pub stats: BatchStats,
    /// Set when the pipeline aborted before finishing its batch.
    pub error: Option<String>,
}

/// Result of one sync cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleResult {
    pub cycle_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub pipelines: Vec<PipelineReport>,
    /// Shutdown was requested before every pipeline ran.
    pub cancelled: bool,
}

impl CycleResult {
    pub fn total_attempted(&self) -> usize {
        self.pipelines.iter().map(|p| p.stats.attempted).sum()
    }

    pub fn total_succeeded(&self) -> usize {
        self.pipelines.iter().map(|p| p.stats.succeeded).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.pipelines.iter().map(|p| p.stats.failed).sum()
    }

    /// Pipelines that aborted.
    pub fn errors(&self) -> impl Iterator<Item = &PipelineReport> {
        self.pipelines.iter().filter(|p| p.error.is_some())
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Reachability of one dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub ok: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Result of a health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// PUNTO database.
    pub source: ComponentHealth,
    /// Staging database.
    pub staging: ComponentHealth,
    pub staging_backend: String,
    /// J-Platform login.
    pub jplatform: ComponentHealth,
    pub healthy: bool,
    pub config_hash: String,
}

impl HealthCheckResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

async fn probe<F>(check: F) -> ComponentHealth
where
    F: Future<Output = Result<()>>,
{
    let start = Instant::now();
    let outcome = check.await;
    ComponentHealth {
        ok: outcome.is_ok(),
        latency_ms: start.elapsed().as_millis() as u64,
        error: outcome.err().map(|e| e.to_string()),
    }
}

pub struct SyncWorker {
    ctx: PipelineContext,
}

impl SyncWorker {
    /// Connect both databases and build the J-Platform client.
    pub async fn connect(config: Config) -> Result<Self> {
        let source_pool = Arc::new(MssqlPool::connect(&config.source, "PUNTO").await?);
        let staging_pool = Arc::new(MssqlPool::connect(&config.staging, "staging").await?);
        let api = JplatformClient::new(&config.jplatform)?;

        let source = Arc::new(PuntoReader::new(source_pool));
        let staging = Arc::new(MssqlStagingStore::new(
            staging_pool,
            config.order.payment_plan_procedure.clone(),
        ));
        Ok(Self::new(config, source, staging, Arc::new(api)))
    }

    /// Like [`connect`](Self::connect) but with a [`NoOpStagingStore`]:
    /// nothing is queued or logged, and queued receipts are never delivered.
    pub async fn connect_without_staging(config: Config) -> Result<Self> {
        let source_pool = Arc::new(MssqlPool::connect(&config.source, "PUNTO").await?);
        let api = JplatformClient::new(&config.jplatform)?;
        let source = Arc::new(PuntoReader::new(source_pool));
        Ok(Self::new(
            config,
            source,
            Arc::new(NoOpStagingStore::new()),
            Arc::new(api),
        ))
    }

    pub fn new(
        config: Config,
        source: Arc<dyn SourceReader>,
        staging: Arc<dyn StagingStore>,
        api: Arc<dyn SlipApi>,
    ) -> Self {
        Self {
            ctx: PipelineContext::new(source, staging, api, Arc::new(config)),
        }
    }

    /// Replace the wall clock used for slip dates.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.ctx = self.ctx.with_clock(clock);
        self
    }

    pub fn config(&self) -> &Config {
        &self.ctx.config
    }

    /// Create the staging tables if they are missing.
    pub async fn init_schema(&self) -> Result<()> {
        self.ctx.staging.init_schema().await?;
        info!(
            "Staging schema initialised ({})",
            self.ctx.staging.backend_type()
        );
        Ok(())
    }

    /// Run cycles until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        self.log_banner();
        let interval = Duration::from_secs(self.ctx.config.sync.interval_seconds);

        while !cancel.is_cancelled() {
            let result = self.run_cycle(&cancel).await;
            if result.total_attempted() > 0 || result.errors().next().is_some() {
                info!(
                    "Cycle {} finished in {:.2}s. Success: {}, Failed: {}",
                    result.cycle_id,
                    result.duration_seconds,
                    result.total_succeeded(),
                    result.total_failed()
                );
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!("Service stopped");
        Ok(())
    }

    /// Run every enabled pipeline once, in order.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleResult {
        let cycle_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("cycle", id = %cycle_id);
        self.cycle(cycle_id, cancel).instrument(span).await
    }

    async fn cycle(&self, cycle_id: String, cancel: &CancellationToken) -> CycleResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let modules = &self.ctx.config.modules;
        let mut pipelines = Vec::new();
        let mut cancelled = false;

        for step in Step::ALL.into_iter().filter(|s| s.enabled(modules)) {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let report = match self.run_step(step, cancel).await {
                Ok(stats) => PipelineReport {
                    name: step.name().to_string(),
                    stats,
                    error: None,
                },
                Err(e) => {
                    error!("Pipeline {} failed: {}", step.name(), e);
                    PipelineReport {
                        name: step.name().to_string(),
                        stats: BatchStats::default(),
                        error: Some(e.to_string()),
                    }
                }
            };
            pipelines.push(report);
        }

        CycleResult {
            cycle_id,
            started_at,
            duration_seconds: start.elapsed().as_secs_f64(),
            pipelines,
            cancelled,
        }
    }

    async fn run_step(&self, step: Step, cancel: &CancellationToken) -> Result<BatchStats> {
        let ctx = &self.ctx;
        match step {
            Step::Import => pipeline::import_receipts(ctx, cancel).await,
            Step::Cash => pipeline::sync_receipts(ctx, cancel, EntityKind::CashReceipt).await,
            Step::Cheque => pipeline::sync_receipts(ctx, cancel, EntityKind::ChequeReceipt).await,
            Step::Order => pipeline::sync_orders(ctx, cancel).await,
            Step::Pos => pipeline::sync_pos(ctx, cancel).await,
            Step::Invoice => pipeline::sync_invoices(ctx, cancel).await,
        }
    }

    /// Ping PUNTO and staging, and log in to J-Platform.
    pub async fn health_check(&self) -> HealthCheckResult {
        let source = probe(self.ctx.source.ping()).await;
        let staging = probe(self.ctx.staging.ping()).await;
        let jplatform = probe(self.ctx.api.check_login()).await;
        let healthy = source.ok && staging.ok && jplatform.ok;

        HealthCheckResult {
            source,
            staging,
            staging_backend: self.ctx.staging.backend_type().to_string(),
            jplatform,
            healthy,
            config_hash: self.ctx.config.hash(),
        }
    }

    fn log_banner(&self) {
        let config = &self.ctx.config;
        info!("PUNTO to J-Platform sync starting");
        info!(
            "Interval: {}s, batch size: {}, import batch size: {}",
            config.sync.interval_seconds, config.sync.batch_size, config.sync.import_batch_size
        );
        info!("J-Platform: {}", config.jplatform.base());
        for step in Step::ALL {
            let state = if step.enabled(&config.modules) { "ON" } else { "OFF" };
            info!("  {:<16} {}", step.name(), state);
        }
        if !self.ctx.salespeople.is_empty() {
            info!("Salesperson mappings: {}", self.ctx.salespeople.len());
        }
        for message in startup_warnings(config) {
            warn!("{}", message);
        }
    }
}

/// Settings that are valid but risky enough to call out at startup.
fn startup_warnings(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();
    if config.modules.sales_invoice && config.invoice.billing_table.is_none() {
        warnings.push(
            "invoice.billing_table is not set: invoiced dispatch lines are never flagged \
             as billed and the same customers will be invoiced again next cycle"
                .to_string(),
        );
    }
    warnings
}

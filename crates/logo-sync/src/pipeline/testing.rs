//! In-memory fakes of the pipeline seams.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use super::PipelineContext;
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::jplatform::{SlipApi, SlipReceipt};
use crate::slips::{
    ApplyCampaignRequest, ArpSlip, ChequeSlip, SafeDepositSlip, SalesInvoice, SalesOrderSlip,
};
use crate::source::{DispatchLine, PosReceipt, PuntoOrder, PuntoOrderLine, PuntoReceipt, SourceReader};
use crate::state::{EntityKind, LogLevel, QueueItem, StagingStore, SyncStatus};

pub const TEST_CONFIG: &str = r#"
source:
  host: punto
  database: PUNTO
  user: sa
staging:
  host: staging
  database: JGDB05
  user: sa
jplatform:
  base_url: http://logo:32001
  username: api
  firm_no: "005"
  period_no: "01"
sync:
  batch_size: 10
invoice:
  billing_table: LG_005_01_STLINE
salesperson_mapping:
  P01: "0101"
"#;

pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(10, 15, 0)
        .unwrap()
}

pub fn test_config() -> Config {
    Config::from_yaml(TEST_CONFIG).unwrap()
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub staging: Arc<FakeStaging>,
    pub api: Arc<FakeApi>,
    pub ctx: PipelineContext,
}

pub fn harness(source: FakeSource, staging: FakeStaging, api: FakeApi) -> Harness {
    harness_with(test_config(), source, staging, api)
}

pub fn harness_with(config: Config, source: FakeSource, staging: FakeStaging, api: FakeApi) -> Harness {
    let source = Arc::new(source);
    let staging = Arc::new(staging);
    let api = Arc::new(api);
    let ctx = PipelineContext::new(
        source.clone(),
        staging.clone(),
        api.clone(),
        Arc::new(config),
    )
    .with_clock(fixed_now);
    Harness {
        source,
        staging,
        api,
        ctx,
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub receipts: Vec<PuntoReceipt>,
    pub orders: Vec<PuntoOrder>,
    pub order_lines: HashMap<String, Vec<PuntoOrderLine>>,
    pub pos: Vec<PosReceipt>,
    pub dispatch_lines: Vec<DispatchLine>,
    /// Makes `pending_dispatch_lines` fail with this message.
    pub dispatch_error: Option<String>,
    pub marked_receipts: Mutex<Vec<(i64, String)>>,
    pub marked_orders: Mutex<Vec<(i64, String)>>,
    pub marked_pos: Mutex<Vec<i64>>,
    pub billed: Mutex<Vec<(String, Vec<i64>, i64)>>,
}

#[async_trait]
impl SourceReader for FakeSource {
    async fn pending_receipts(&self, limit: usize) -> Result<Vec<PuntoReceipt>> {
        Ok(self.receipts.iter().take(limit).cloned().collect())
    }

    async fn mark_receipt_transferred(&self, id: i64, batch: &str) -> Result<()> {
        self.marked_receipts
            .lock()
            .unwrap()
            .push((id, batch.to_string()));
        Ok(())
    }

    async fn pending_orders(&self, limit: usize, min_date: NaiveDate) -> Result<Vec<PuntoOrder>> {
        Ok(self
            .orders
            .iter()
            .filter(|o| o.order_date.date() >= min_date)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn order_lines(&self, fis_no: &str) -> Result<Vec<PuntoOrderLine>> {
        Ok(self.order_lines.get(fis_no).cloned().unwrap_or_default())
    }

    async fn mark_order_transferred(&self, id: i64, batch: &str) -> Result<()> {
        self.marked_orders
            .lock()
            .unwrap()
            .push((id, batch.to_string()));
        Ok(())
    }

    async fn pending_pos(&self, limit: usize) -> Result<Vec<PosReceipt>> {
        Ok(self.pos.iter().take(limit).cloned().collect())
    }

    async fn mark_pos_transferred(&self, id: i64) -> Result<()> {
        self.marked_pos.lock().unwrap().push(id);
        Ok(())
    }

    async fn pending_dispatch_lines(&self) -> Result<Vec<DispatchLine>> {
        if let Some(message) = &self.dispatch_error {
            return Err(SyncError::State(message.clone()));
        }
        Ok(self.dispatch_lines.clone())
    }

    async fn mark_lines_billed(&self, table: &str, refs: &[i64], invoice_ref: i64) -> Result<()> {
        self.billed
            .lock()
            .unwrap()
            .push((table.to_string(), refs.to_vec(), invoice_ref));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub queue_id: Option<i64>,
    pub level: LogLevel,
    pub message: String,
    pub request: Option<String>,
    pub response: Option<String>,
}

pub type StatusRow = (i64, SyncStatus, Option<String>, Option<String>);

pub struct FakeStaging {
    pub queued: Vec<QueueItem>,
    pub payment_plans: HashMap<String, String>,
    next_id: AtomicI64,
    enqueued: Mutex<Vec<(EntityKind, String, String)>>,
    statuses: Mutex<Vec<StatusRow>>,
    logs: Mutex<Vec<LogRow>>,
}

impl Default for FakeStaging {
    fn default() -> Self {
        Self {
            queued: Vec::new(),
            payment_plans: HashMap::new(),
            next_id: AtomicI64::new(100),
            enqueued: Mutex::new(Vec::new()),
            statuses: Mutex::new(Vec::new()),
            logs: Mutex::new(Vec::new()),
        }
    }
}

impl FakeStaging {
    pub fn with_queued(items: Vec<QueueItem>) -> Self {
        Self {
            queued: items,
            ..Default::default()
        }
    }

    pub fn enqueued(&self) -> Vec<(EntityKind, String, String)> {
        self.enqueued.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<StatusRow> {
        self.statuses.lock().unwrap().clone()
    }

    /// Final status per queue id, in the order ids were first touched.
    pub fn final_statuses(&self) -> Vec<(i64, SyncStatus)> {
        let mut out: Vec<(i64, SyncStatus)> = Vec::new();
        for (id, status, _, _) in self.statuses() {
            match out.iter_mut().find(|(seen, _)| *seen == id) {
                Some(entry) => entry.1 = status,
                None => out.push((id, status)),
            }
        }
        out
    }

    pub fn logs(&self) -> Vec<LogRow> {
        self.logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl StagingStore for FakeStaging {
    async fn init_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn enqueue(&self, kind: EntityKind, entity_id: &str, payload: &str) -> Result<i64> {
        self.enqueued
            .lock()
            .unwrap()
            .push((kind, entity_id.to_string(), payload.to_string()));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn pending(&self, kind: EntityKind, limit: usize) -> Result<Vec<QueueItem>> {
        Ok(self
            .queued
            .iter()
            .filter(|q| q.entity_type == kind)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: i64,
        status: SyncStatus,
        error: Option<&str>,
        reference: Option<&str>,
    ) -> Result<()> {
        self.statuses.lock().unwrap().push((
            id,
            status,
            error.map(str::to_string),
            reference.map(str::to_string),
        ));
        Ok(())
    }

    async fn log(
        &self,
        queue_id: Option<i64>,
        level: LogLevel,
        message: &str,
        request: Option<&str>,
        response: Option<&str>,
    ) -> Result<()> {
        self.logs.lock().unwrap().push(LogRow {
            queue_id,
            level,
            message: message.to_string(),
            request: request.map(str::to_string),
            response: response.map(str::to_string),
        });
        Ok(())
    }

    async fn payment_plan_for_customer(&self, customer_code: &str) -> Result<Option<String>> {
        Ok(self.payment_plans.get(customer_code).cloned())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "fake"
    }
}

/// Replays scripted results in call order; once the script runs out every
/// call succeeds with transaction number "1".
#[derive(Default)]
pub struct FakeApi {
    script: Mutex<VecDeque<Result<SlipReceipt>>>,
    calls: Mutex<Vec<(&'static str, Value)>>,
    cancel_on_call: Option<CancellationToken>,
}

impl FakeApi {
    pub fn scripted(results: Vec<Result<SlipReceipt>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
            cancel_on_call: None,
        }
    }

    /// Cancel `token` as soon as the first request arrives, as if a shutdown
    /// signal landed while it was in flight.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_call = Some(token);
        self
    }

    pub fn calls(&self) -> Vec<(&'static str, Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn answer<T: Serialize>(&self, endpoint: &'static str, body: &T) -> Result<SlipReceipt> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint, serde_json::to_value(body).unwrap()));
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SlipReceipt::parse(r#"{"transactionNo":"1"}"#)))
    }
}

#[async_trait]
impl SlipApi for FakeApi {
    async fn post_safe_deposit_slip(&self, slip: &SafeDepositSlip) -> Result<SlipReceipt> {
        self.answer("safedepositslips", slip)
    }

    async fn post_cheque_slip(&self, slip: &ChequeSlip) -> Result<SlipReceipt> {
        self.answer("chequepnoteslips", slip)
    }

    async fn post_sales_order(&self, slip: &SalesOrderSlip) -> Result<SlipReceipt> {
        self.answer("salesOrder", slip)
    }

    async fn post_arp_slip(&self, slip: &ArpSlip) -> Result<SlipReceipt> {
        self.answer("arpslips", slip)
    }

    async fn post_sales_invoice(&self, invoice: &SalesInvoice) -> Result<SlipReceipt> {
        self.answer("invoices/sales", invoice)
    }

    async fn apply_campaign(&self, request: &ApplyCampaignRequest) -> Result<SlipReceipt> {
        self.answer("applyCampaign", request)
    }

    async fn check_login(&self) -> Result<()> {
        Ok(())
    }
}

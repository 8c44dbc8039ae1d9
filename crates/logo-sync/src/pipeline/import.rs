use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use super::{BatchStats, PipelineContext};
use crate::error::Result;
use crate::mapping::CashReceipt;
use crate::source::PuntoReceipt;
use crate::state::LogLevel;

/// Copy untransferred PUNTO collections into the staging queue.
///
/// Each receipt is queued under its own kind (cash or cheque) keyed by the
/// PUNTO `ID`, then flagged transferred under one batch GUID. A receipt whose
/// queue write fails is left for the next cycle.
pub async fn import_receipts(ctx: &PipelineContext, cancel: &CancellationToken) -> Result<BatchStats> {
    let rows = ctx
        .source
        .pending_receipts(ctx.config.sync.import_batch_size)
        .await?;
    let mut stats = BatchStats::default();
    if rows.is_empty() {
        return Ok(stats);
    }

    let batch = Uuid::new_v4().to_string();
    info!("Importing {} PUNTO receipts (batch {})", rows.len(), batch);

    for row in &rows {
        if cancel.is_cancelled() {
            break;
        }
        match import_one(ctx, row, &batch).await {
            Ok(()) => stats.success(),
            Err(e) => {
                error!("Receipt {} import failed: {}", row.id, e);
                stats.failure();
            }
        }
    }

    let summary = format!(
        "PUNTO receipt import: {} success, {} failed. BatchGuid: {}",
        stats.succeeded, stats.failed, batch
    );
    info!("{}", summary);
    ctx.staging
        .log(None, LogLevel::Info, &summary, None, None)
        .await?;
    Ok(stats)
}

async fn import_one(ctx: &PipelineContext, row: &PuntoReceipt, batch: &str) -> Result<()> {
    let receipt = CashReceipt::from_punto(row, &ctx.config.cash.default_cash_account, ctx.now().date());
    let payload = serde_json::to_string(&receipt)?;
    ctx.staging
        .enqueue(receipt.kind(), &row.id.to_string(), &payload)
        .await?;
    ctx.source.mark_receipt_transferred(row.id, batch).await
}

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::{deliver, BatchStats, PipelineContext};
use crate::error::{Result, SyncError};
use crate::mapping::{build_cheque_slip, build_safe_deposit_slip, CashReceipt};
use crate::state::{EntityKind, LogLevel, QueueItem, SyncStatus};

/// Post pending queued receipts of `kind` (cash or cheque).
pub async fn sync_receipts(
    ctx: &PipelineContext,
    cancel: &CancellationToken,
    kind: EntityKind,
) -> Result<BatchStats> {
    if !matches!(kind, EntityKind::CashReceipt | EntityKind::ChequeReceipt) {
        return Err(SyncError::State(format!("{} is not a receipt queue", kind)));
    }

    let items = ctx.staging.pending(kind, ctx.config.sync.batch_size).await?;
    let mut stats = BatchStats::default();
    if items.is_empty() {
        return Ok(stats);
    }
    info!("{} batch: {} pending", kind.label(), items.len());

    for item in &items {
        if cancel.is_cancelled() {
            break;
        }
        match sync_one(ctx, kind, item).await {
            Ok(true) => stats.success(),
            Ok(false) => stats.failure(),
            Err(e) => {
                error!("{} {} failed: {}", kind.label(), item.entity_id, e);
                stats.failure();
            }
        }
    }

    info!(
        "{} batch complete. Success: {}, Failed: {}",
        kind.label(),
        stats.succeeded,
        stats.failed
    );
    Ok(stats)
}

async fn sync_one(ctx: &PipelineContext, kind: EntityKind, item: &QueueItem) -> Result<bool> {
    let receipt = match decode(item) {
        Ok(receipt) => receipt,
        Err(e) => {
            error!("Queue row {}: {}", item.id, e);
            ctx.staging
                .update_status(item.id, SyncStatus::Failed, Some("Payload parse error"), None)
                .await?;
            ctx.staging
                .log(
                    Some(item.id),
                    LogLevel::Error,
                    &e.to_string(),
                    item.payload.as_deref(),
                    None,
                )
                .await?;
            return Ok(false);
        }
    };

    let offset = ctx.offset();
    let outcome = match kind {
        EntityKind::ChequeReceipt => {
            let slip = build_cheque_slip(&receipt, &ctx.config.cheque, offset);
            let request = serde_json::to_string(&slip)?;
            deliver(
                ctx.staging.as_ref(),
                item.id,
                kind,
                &request,
                ctx.api.post_cheque_slip(&slip),
            )
            .await?
        }
        _ => {
            let slip = build_safe_deposit_slip(&receipt, ctx.now(), offset);
            let request = serde_json::to_string(&slip)?;
            deliver(
                ctx.staging.as_ref(),
                item.id,
                kind,
                &request,
                ctx.api.post_safe_deposit_slip(&slip),
            )
            .await?
        }
    };
    Ok(outcome.is_delivered())
}

fn decode(item: &QueueItem) -> Result<CashReceipt> {
    let payload = item
        .payload
        .as_deref()
        .ok_or_else(|| SyncError::Payload("empty payload".to_string()))?;
    serde_json::from_str(payload).map_err(|e| SyncError::Payload(e.to_string()))
}

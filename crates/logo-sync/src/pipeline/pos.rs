use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::{deliver, BatchStats, PipelineContext};
use crate::error::Result;
use crate::mapping::build_arp_slip;
use crate::source::PosReceipt;
use crate::state::EntityKind;

/// Post virtual POS collections as customer account slips.
pub async fn sync_pos(ctx: &PipelineContext, cancel: &CancellationToken) -> Result<BatchStats> {
    let rows = ctx.source.pending_pos(ctx.config.sync.batch_size).await?;
    let mut stats = BatchStats::default();
    if rows.is_empty() {
        return Ok(stats);
    }
    info!("Virtual POS batch: {} pending", rows.len());

    for pos in &rows {
        if cancel.is_cancelled() {
            break;
        }
        match sync_one(ctx, pos).await {
            Ok(true) => stats.success(),
            Ok(false) => stats.failure(),
            Err(e) => {
                error!("Virtual POS {} failed: {}", pos.id, e);
                stats.failure();
            }
        }
    }

    info!(
        "Virtual POS batch complete. Success: {}, Failed: {}",
        stats.succeeded, stats.failed
    );
    Ok(stats)
}

async fn sync_one(ctx: &PipelineContext, pos: &PosReceipt) -> Result<bool> {
    let salesperson = ctx.salespeople.resolve(&pos.salesperson_code);
    let slip = build_arp_slip(pos, &salesperson, ctx.offset());
    let request = serde_json::to_string(&slip)?;
    let queue_id = ctx
        .staging
        .enqueue(EntityKind::SanalPos, &pos.id.to_string(), &request)
        .await?;

    let outcome = deliver(
        ctx.staging.as_ref(),
        queue_id,
        EntityKind::SanalPos,
        &request,
        ctx.api.post_arp_slip(&slip),
    )
    .await?;

    if outcome.is_delivered() {
        ctx.source.mark_pos_transferred(pos.id).await?;
        return Ok(true);
    }
    Ok(false)
}

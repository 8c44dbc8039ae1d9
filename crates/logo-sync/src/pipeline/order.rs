use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{deliver, BatchStats, PipelineContext};
use crate::error::Result;
use crate::mapping::build_sales_order;
use crate::source::PuntoOrder;
use crate::state::EntityKind;

/// Post pending PUNTO orders as J-Platform sales orders.
pub async fn sync_orders(ctx: &PipelineContext, cancel: &CancellationToken) -> Result<BatchStats> {
    let settings = &ctx.config.order;
    let orders = ctx
        .source
        .pending_orders(ctx.config.sync.batch_size, settings.min_order_date)
        .await?;
    let mut stats = BatchStats::default();
    if orders.is_empty() {
        return Ok(stats);
    }

    let batch = Uuid::new_v4().to_string();
    info!("Order batch: {} pending (batch {})", orders.len(), batch);

    for order in &orders {
        if cancel.is_cancelled() {
            break;
        }
        match sync_one(ctx, order, &batch).await {
            Ok(true) => stats.success(),
            Ok(false) => stats.failure(),
            Err(e) => {
                error!("Order {} failed: {}", order.fis_no, e);
                stats.failure();
            }
        }
    }

    info!(
        "Order batch complete. Success: {}, Failed: {}",
        stats.succeeded, stats.failed
    );
    Ok(stats)
}

async fn sync_one(ctx: &PipelineContext, order: &PuntoOrder, batch: &str) -> Result<bool> {
    let lines = ctx.source.order_lines(&order.fis_no).await?;
    if lines.is_empty() {
        warn!("Order {} has no lines, skipping", order.fis_no);
        return Ok(false);
    }

    let salesperson = ctx.salespeople.resolve_opt(order.salesperson_code.as_deref());
    let payment_plan = ctx
        .staging
        .payment_plan_for_customer(&order.customer_code)
        .await?;

    let slip = build_sales_order(
        order,
        &lines,
        salesperson.as_deref(),
        payment_plan.as_deref(),
        &ctx.config.order.division_prefix,
        ctx.now(),
        ctx.offset(),
    );
    let request = serde_json::to_string(&slip)?;
    let queue_id = ctx
        .staging
        .enqueue(EntityKind::Order, &order.fis_no, &request)
        .await?;

    let outcome = deliver(
        ctx.staging.as_ref(),
        queue_id,
        EntityKind::Order,
        &request,
        ctx.api.post_sales_order(&slip),
    )
    .await?;

    if !outcome.is_delivered() {
        return Ok(false);
    }
    ctx.source.mark_order_transferred(order.id, batch).await?;
    Ok(true)
}

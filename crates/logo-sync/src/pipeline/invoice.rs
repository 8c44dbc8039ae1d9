use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{deliver, BatchStats, Delivery, PipelineContext};
use crate::error::Result;
use crate::mapping::{billed_line_refs, build_invoice, group_by_customer, InvoiceGroup};
use crate::slips::{ApplyCampaignRequest, SalesInvoice};
use crate::state::{EntityKind, LogLevel};

/// Bill open dispatches: one wholesale invoice per customer.
///
/// At most `batch_size` customers are invoiced per cycle; the rest wait for
/// the next one.
pub async fn sync_invoices(ctx: &PipelineContext, cancel: &CancellationToken) -> Result<BatchStats> {
    let lines = ctx.source.pending_dispatch_lines().await?;
    let mut stats = BatchStats::default();
    if lines.is_empty() {
        return Ok(stats);
    }

    let mut groups = group_by_customer(lines);
    let total = groups.len();
    groups.truncate(ctx.config.sync.batch_size);
    info!(
        "Sales invoice batch: {} customers with open dispatches, invoicing {}",
        total,
        groups.len()
    );

    for group in &groups {
        if cancel.is_cancelled() {
            break;
        }
        match sync_one(ctx, group).await {
            Ok(true) => stats.success(),
            Ok(false) => stats.failure(),
            Err(e) => {
                error!("Sales invoice for {} failed: {}", group.customer_code, e);
                stats.failure();
            }
        }
    }

    info!(
        "Sales invoice batch complete. Success: {}, Failed: {}",
        stats.succeeded, stats.failed
    );
    Ok(stats)
}

async fn sync_one(ctx: &PipelineContext, group: &InvoiceGroup) -> Result<bool> {
    let settings = &ctx.config.invoice;
    let invoice = build_invoice(group, settings, &ctx.salespeople, ctx.now(), ctx.offset());
    let request = serde_json::to_string(&invoice)?;
    let queue_id = ctx
        .staging
        .enqueue(EntityKind::SalesInvoice, &group.customer_code, &request)
        .await?;

    let receipt = match deliver(
        ctx.staging.as_ref(),
        queue_id,
        EntityKind::SalesInvoice,
        &request,
        ctx.api.post_sales_invoice(&invoice),
    )
    .await?
    {
        Delivery::Delivered(receipt) => receipt,
        Delivery::Rejected(_) => return Ok(false),
    };

    if let (Some(series), Some(number)) = (receipt.invoice_no_part1(), receipt.invoice_no_part2()) {
        info!(
            "Invoice {} / {} created for {}",
            series, number, group.customer_code
        );
    }
    if let Some(code) = receipt.code.as_deref() {
        apply_campaign(ctx, queue_id, code, &invoice).await?;
    }

    if let Some(table) = settings.billing_table.as_deref() {
        let refs = billed_line_refs(group);
        let invoice_ref = receipt.logical_ref.unwrap_or(0);
        ctx.source.mark_lines_billed(table, &refs, invoice_ref).await?;
        info!(
            "Flagged {} dispatch lines of {} as billed (invoice ref {})",
            refs.len(),
            group.customer_code,
            invoice_ref
        );
    }
    Ok(true)
}

/// Campaign application never fails the invoice; a rejection is only
/// recorded as a warning.
async fn apply_campaign(
    ctx: &PipelineContext,
    queue_id: i64,
    code: &str,
    invoice: &SalesInvoice,
) -> Result<()> {
    let request = ApplyCampaignRequest::for_invoice(code, invoice);
    match ctx.api.apply_campaign(&request).await {
        Ok(_) => info!("Campaigns applied to invoice {}", code),
        Err(e) => {
            warn!("Applying campaigns to invoice {} failed: {}", code, e);
            ctx.staging
                .log(
                    Some(queue_id),
                    LogLevel::Warn,
                    &format!("ApplyCampaign failed for {}: {}", code, e),
                    Some(&serde_json::to_string(&request)?),
                    e.response_body(),
                )
                .await?;
        }
    }
    Ok(())
}

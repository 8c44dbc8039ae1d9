//! J-Platform REST API.
//!
//! [`SlipApi`] is what the pipelines call; [`JplatformClient`] implements it
//! over HTTP with a cached, mutex-guarded login token.

mod client;
mod response;

pub use client::JplatformClient;
pub use response::{error_message, SlipReceipt};

use crate::error::Result;
use crate::slips::{
    ApplyCampaignRequest, ArpSlip, ChequeSlip, SafeDepositSlip, SalesInvoice, SalesOrderSlip,
};
use async_trait::async_trait;

pub const LOGIN_PATH: &str = "/logo/restservices/rest/login";
pub const LOGOUT_PATH: &str = "/logo/restservices/rest/logout";
pub const SAFE_DEPOSIT_SLIPS_PATH: &str = "/logo/restservices/rest/v2.0/safedepositslips";
pub const CHEQUE_SLIPS_PATH: &str = "/logo/restservices/rest/v2.0/chequepnoteslips?slipType=1";
pub const SALES_ORDER_PATH: &str = "/logo/restservices/rest/v2.0/salesOrder";
pub const ARP_SLIPS_PATH: &str = "/logo/restservices/rest/v2.0/arpslips?slipType=08";
pub const SALES_INVOICE_PATH: &str = "/logo/restservices/rest/v2.0/invoices/sales?invoiceType=8";
pub const APPLY_CAMPAIGN_PATH: &str =
    "/logo/restservices/rest/v2.0/invoices/sales/applyCampaign?invoiceType=8&canSaveAppliedCampaign=true";

/// Slip-creating calls against J-Platform.
#[async_trait]
pub trait SlipApi: Send + Sync {
    /// Cash collection (`safedepositslips`).
    async fn post_safe_deposit_slip(&self, slip: &SafeDepositSlip) -> Result<SlipReceipt>;

    /// Cheque entry slip (`chequepnoteslips?slipType=1`).
    async fn post_cheque_slip(&self, slip: &ChequeSlip) -> Result<SlipReceipt>;

    async fn post_sales_order(&self, slip: &SalesOrderSlip) -> Result<SlipReceipt>;

    /// Customer account slip for virtual POS (`arpslips?slipType=08`).
    async fn post_arp_slip(&self, slip: &ArpSlip) -> Result<SlipReceipt>;

    /// Wholesale invoice (`invoices/sales?invoiceType=8`).
    async fn post_sales_invoice(&self, invoice: &SalesInvoice) -> Result<SlipReceipt>;

    /// Apply and save campaigns on an invoice that already exists.
    async fn apply_campaign(&self, request: &ApplyCampaignRequest) -> Result<SlipReceipt>;

    /// Drop any cached token and log in again.
    async fn check_login(&self) -> Result<()>;
}

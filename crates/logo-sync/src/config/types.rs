//! Configuration type definitions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// PUNTO database the records are read from.
    pub source: DatabaseConfig,

    /// Staging database (JGDB05) holding the sync queue and log.
    pub staging: DatabaseConfig,

    /// J-Platform REST endpoint and credentials.
    pub jplatform: JplatformConfig,

    /// Scheduling and batch sizes.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Per-pipeline on/off switches.
    #[serde(default)]
    pub modules: ModulesConfig,

    /// Cash receipt defaults.
    #[serde(default)]
    pub cash: CashConfig,

    /// Cheque slip defaults.
    #[serde(default)]
    pub cheque: ChequeConfig,

    /// Sales order settings.
    #[serde(default)]
    pub order: OrderConfig,

    /// Sales invoice settings.
    #[serde(default)]
    pub invoice: InvoiceConfig,

    /// PUNTO salesperson code to Logo salesperson code.
    #[serde(default)]
    pub salesperson_mapping: BTreeMap<String, String>,
}

/// SQL Server connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 1433).
    #[serde(default = "default_mssql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// TLS mode: "true" (required) or "false"/"disable".
    #[serde(default = "default_encrypt")]
    pub encrypt: String,

    /// Accept self-signed server certificates.
    #[serde(default)]
    pub trust_server_cert: bool,

    /// Pool size (default: 4).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("encrypt", &self.encrypt)
            .field("trust_server_cert", &self.trust_server_cert)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// J-Platform REST API settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct JplatformConfig {
    /// Base URL, e.g. `http://logo-host:32001`.
    pub base_url: String,

    /// API user.
    pub username: String,

    /// API password.
    #[serde(default)]
    pub password: String,

    /// Firm number (numeric, e.g. "005").
    pub firm_no: String,

    /// Period number (numeric, e.g. "01").
    pub period_no: String,

    /// Login language code (default: "TRTR").
    #[serde(default = "default_language")]
    pub language: String,

    /// Request timeout in seconds (default: 60).
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// How long a login token is reused (default: 25 minutes).
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,

    /// Offset appended to every date sent to J-Platform (default: "+03:00").
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl std::fmt::Debug for JplatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JplatformConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("firm_no", &self.firm_no)
            .field("period_no", &self.period_no)
            .field("language", &self.language)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("utc_offset", &self.utc_offset)
            .finish()
    }
}

/// Scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Pause between cycles (default: 60).
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,

    /// Records per pipeline per cycle (default: 50).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// PUNTO receipts imported per cycle (default: 100).
    #[serde(default = "default_import_batch_size")]
    pub import_batch_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            batch_size: default_batch_size(),
            import_batch_size: default_import_batch_size(),
        }
    }
}

/// Which pipelines run each cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulesConfig {
    #[serde(default = "default_true")]
    pub import_receipts: bool,

    #[serde(default = "default_true")]
    pub cash_receipt: bool,

    #[serde(default = "default_true")]
    pub cheque_receipt: bool,

    #[serde(default = "default_true")]
    pub order: bool,

    #[serde(default = "default_true")]
    pub sanal_pos: bool,

    #[serde(default = "default_true")]
    pub sales_invoice: bool,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            import_receipts: true,
            cash_receipt: true,
            cheque_receipt: true,
            order: true,
            sanal_pos: true,
            sales_invoice: true,
        }
    }
}

/// Cash receipt settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashConfig {
    /// Safe deposit (kasa) code used for imported receipts (default: "01").
    #[serde(default = "default_cash_account")]
    pub default_cash_account: String,
}

impl Default for CashConfig {
    fn default() -> Self {
        Self {
            default_cash_account: default_cash_account(),
        }
    }
}

/// Cheque slip settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChequeConfig {
    #[serde(default = "default_cheque_org_unit")]
    pub org_unit: String,

    #[serde(default = "default_cheque_org_unit_description")]
    pub org_unit_description: String,
}

impl Default for ChequeConfig {
    fn default() -> Self {
        Self {
            org_unit: default_cheque_org_unit(),
            org_unit_description: default_cheque_org_unit_description(),
        }
    }
}

/// Sales order settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfig {
    /// Orders dated before this are never picked up.
    #[serde(default = "default_min_order_date")]
    pub min_order_date: NaiveDate,

    /// Division prefix for derived org unit and warehouse codes (default: "01").
    #[serde(default = "default_division_prefix")]
    pub division_prefix: String,

    /// Staging procedure returning a customer's payment plan code.
    #[serde(default = "default_payment_plan_procedure")]
    pub payment_plan_procedure: String,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            min_order_date: default_min_order_date(),
            division_prefix: default_division_prefix(),
            payment_plan_procedure: default_payment_plan_procedure(),
        }
    }
}

/// Sales invoice settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceConfig {
    /// Org unit used when a dispatch line has no ISYERI (default: "01.7").
    #[serde(default = "default_invoice_org_unit")]
    pub default_org_unit: String,

    /// Warehouse used when a dispatch line has no AMBAR (default: "01.7.7").
    #[serde(default = "default_invoice_warehouse")]
    pub default_warehouse: String,

    /// Stock line table to flag as billed, e.g. `LG_005_01_STLINE`.
    /// Billing is not written back when unset.
    #[serde(default)]
    pub billing_table: Option<String>,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            default_org_unit: default_invoice_org_unit(),
            default_warehouse: default_invoice_warehouse(),
            billing_table: None,
        }
    }
}

fn default_mssql_port() -> u16 {
    1433
}

fn default_encrypt() -> String {
    "true".to_string()
}

fn default_max_connections() -> u32 {
    4
}

fn default_language() -> String {
    "TRTR".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_token_ttl_minutes() -> i64 {
    25
}

fn default_utc_offset() -> String {
    "+03:00".to_string()
}

fn default_interval_seconds() -> u64 {
    60
}

fn default_batch_size() -> usize {
    50
}

fn default_import_batch_size() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_cash_account() -> String {
    "01".to_string()
}

fn default_cheque_org_unit() -> String {
    "01".to_string()
}

fn default_cheque_org_unit_description() -> String {
    "MERKEZ".to_string()
}

fn default_min_order_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default()
}

fn default_division_prefix() -> String {
    "01".to_string()
}

fn default_payment_plan_procedure() -> String {
    "JPL_GetPaymentPlanByCustomer".to_string()
}

fn default_invoice_org_unit() -> String {
    "01.7".to_string()
}

fn default_invoice_warehouse() -> String {
    "01.7.7".to_string()
}

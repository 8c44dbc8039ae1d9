//! Pure transforms from PUNTO rows to J-Platform slip bodies.
//!
//! Nothing in here touches a database or the network. Every mapper takes the
//! wall-clock `now` and the UTC offset explicitly so the output is a function
//! of its inputs alone.

mod invoice;
mod order;
mod pos;
mod receipt;
mod salesperson;

pub use invoice::{billed_line_refs, build_invoice, group_by_customer, installment_total, InvoiceGroup};
pub use order::build_sales_order;
pub use pos::build_arp_slip;
pub use receipt::{build_cheque_slip, build_safe_deposit_slip, CashReceipt};
pub use salesperson::SalespersonMap;

use chrono::{NaiveDate, NaiveDateTime};

/// `2026-03-01T14:05:09.000+03:00` (milliseconds always zero).
pub fn logo_datetime(dt: NaiveDateTime, offset: &str) -> String {
    format!("{}.000{}", dt.format("%Y-%m-%dT%H:%M:%S"), offset)
}

/// `2026-03-01T14:05:09.123+03:00` (real milliseconds).
pub fn logo_datetime_millis(dt: NaiveDateTime, offset: &str) -> String {
    format!("{}{}", dt.format("%Y-%m-%dT%H:%M:%S%.3f"), offset)
}

/// `2026-03-01T00:00:00.000+03:00`
pub fn logo_date(d: NaiveDate, offset: &str) -> String {
    format!("{}T00:00:00.000{}", d.format("%Y-%m-%d"), offset)
}

/// Warehouse code from a PUNTO depot number: `"7"` becomes `"01.7.7"`.
pub fn derive_warehouse(depot: Option<&str>, division: &str) -> Option<String> {
    let d = depot.map(str::trim).filter(|d| !d.is_empty())?;
    Some(format!("{division}.{d}.{d}"))
}

/// Org unit code from a PUNTO depot number: `"7"` becomes `"01.7"`.
pub fn derive_org_unit(depot: Option<&str>, division: &str) -> Option<String> {
    let d = depot.map(str::trim).filter(|d| !d.is_empty())?;
    Some(format!("{division}.{d}"))
}

/// Document tracking number: the slip number from its first digit on
/// (`"D1227103"` becomes `"1227103"`).
pub fn derive_document_tracking(fis_no: &str) -> Option<String> {
    let start = fis_no.find(|c: char| c.is_ascii_digit())?;
    Some(fis_no[start..].to_string())
}

/// J-Platform transaction currency code.
pub fn currency_tc_type(currency: &str) -> i32 {
    match currency.to_ascii_uppercase().as_str() {
        "USD" => 1,
        "GBP" => 2,
        "EUR" => 20,
        _ => 0,
    }
}

/// Treats `None`, empty and whitespace-only strings alike.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

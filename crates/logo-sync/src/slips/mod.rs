//! Request bodies for the J-Platform slip endpoints.
//!
//! Key names follow the vendor contract exactly, including its odd
//! capitalisation (`SalespersonCode`, `numberofRecords`, `documenDate`).
//! Fields whose vendor default is zero, empty or false are left out unless a
//! mapper fills them; J-Platform applies its own defaults for absent keys.

mod arp;
mod cheque;
mod invoice;
mod order;
mod safe_deposit;

pub use arp::*;
pub use cheque::*;
pub use invoice::*;
pub use order::*;
pub use safe_deposit::*;

use serde::{Deserialize, Serialize};

/// Wall-clock time block used by most slip headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoTime {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub milisecond: u32,
}

impl LogoTime {
    /// Hour and minute only; seconds are always sent as zero.
    pub fn hm(hour: u32, minute: u32) -> Self {
        Self {
            hour,
            minute,
            second: 0,
            milisecond: 0,
        }
    }
}

/// Always-empty `extensions` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extensions {
    pub list: Vec<serde_json::Value>,
}

/// Placeholder row that carries nothing but its index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOnly {
    pub index: i32,
}

pub(crate) fn is_zero(v: &rust_decimal::Decimal) -> bool {
    v.is_zero()
}

pub(crate) fn is_false(v: &bool) -> bool {
    !*v
}

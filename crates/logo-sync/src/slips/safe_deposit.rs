use super::{Extensions, LogoTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Safe deposit transaction type for a cash collection.
pub const CASH_COLLECTION: i32 = 11;

/// `POST safedepositslips` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeDepositSlip {
    pub date: String,
    pub hour: LogoTime,
    #[serde(rename = "pCPointCode")]
    pub pc_point_code: String,
    #[serde(rename = "safeDepositCode")]
    pub safe_deposit_code: String,
    pub transaction: Vec<serde_json::Value>,
    pub transaction2: Vec<SafeDepositTransaction>,
    pub transaction3: Vec<serde_json::Value>,
    pub transaction4: Vec<serde_json::Value>,
    pub extensions: Extensions,
    pub index: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeDepositTransaction {
    #[serde(rename = "type")]
    pub kind: i32,
    pub transaction_number: String,
    pub document_no: String,
    pub document_date: String,
    pub description: String,
    #[serde(rename = "aRaPCode")]
    pub arap_code: String,
    pub customer_name: String,
    pub amount: Decimal,
    pub tc_type: i32,
    #[serde(rename = "amountTC")]
    pub amount_tc: Decimal,
    pub tc_exchange_rate: Decimal,
    pub vat_inclusive_amount: Decimal,
    pub private_company: bool,
    pub vat_included: bool,
    pub note_transaction: Vec<serde_json::Value>,
    pub index: i32,
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `POST arpslips?slipType=08` body (customer account credit from a virtual POS).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArpSlip {
    pub slip_date: String,
    pub slip_no: String,
    pub doc_no: String,
    pub org_unit_code: String,
    pub footnote: String,
    pub slip_transaction: Vec<ArpSlipTransaction>,
    pub index: i32,
    pub serialize_nulls: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArpSlipTransaction {
    pub arp_info_code: String,
    pub arp_info_def: String,
    pub exch_rate_difference_currency_type: i32,
    pub line_credit: Decimal,
    pub reporting_currency: String,
    pub payment_plan_code: String,
    pub trans_type: i32,
    pub employee_code: String,
    pub cross_acc_type: i32,
    pub cross_acc_code: String,
    pub cross_acc_def: String,
    pub index: i32,
    pub serialize_nulls: bool,
}

impl Default for ArpSlipTransaction {
    fn default() -> Self {
        Self {
            arp_info_code: String::new(),
            arp_info_def: String::new(),
            exch_rate_difference_currency_type: -1,
            line_credit: Decimal::ZERO,
            reporting_currency: "USD".to_string(),
            payment_plan_code: String::new(),
            trans_type: -1,
            employee_code: String::new(),
            cross_acc_type: 2,
            cross_acc_code: String::new(),
            cross_acc_def: String::new(),
            index: 0,
            serialize_nulls: false,
        }
    }
}

use super::IndexOnly;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `POST chequepnoteslips?slipType=1` body (customer cheque entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChequeSlip {
    pub slip_date: String,
    pub org_unit: String,
    pub org_unit_description: String,
    pub arap_code: String,
    pub arap_title: String,
    #[serde(rename = "SalespersonCode")]
    pub salesperson_code: String,
    pub note_transaction: Vec<NoteTransaction>,
    pub notes: String,
    pub total_local_currency: Decimal,
    pub averg_due_date: String,
    #[serde(rename = "numberofRecords")]
    pub number_of_records: Decimal,
    pub bank_transaction: Vec<IndexOnly>,
    pub analysis_transaction: Vec<IndexOnly>,
    pub remaining_rate: Decimal,
    #[serde(rename = "mainChartofAccounts")]
    pub main_chart_of_accounts: String,
    #[serde(rename = "mainChartofAccountsDesc")]
    pub main_chart_of_accounts_desc: String,
    pub index: i32,
}

impl Default for ChequeSlip {
    fn default() -> Self {
        Self {
            slip_date: String::new(),
            org_unit: String::new(),
            org_unit_description: String::new(),
            arap_code: String::new(),
            arap_title: String::new(),
            salesperson_code: String::new(),
            note_transaction: Vec::new(),
            notes: String::new(),
            total_local_currency: Decimal::ZERO,
            averg_due_date: String::new(),
            number_of_records: Decimal::ONE,
            bank_transaction: vec![IndexOnly::default()],
            analysis_transaction: vec![IndexOnly::default()],
            remaining_rate: Decimal::ONE_HUNDRED,
            main_chart_of_accounts: "04".to_string(),
            main_chart_of_accounts_desc: "Günlük / Mahsup".to_string(),
            index: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteTransaction {
    pub portfolio_no: String,
    pub serial_no: String,
    pub due_date: String,
    pub debtor: String,
    pub place_of_payment: String,
    pub bank_name: String,
    pub amount: Decimal,
    pub cheque_prom_note_transaction: Vec<serde_json::Value>,
    pub index: i32,
}

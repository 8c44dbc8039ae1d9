use super::{currency_tc_type, logo_date, logo_datetime_millis};
use crate::config::ChequeConfig;
use crate::slips::{
    ChequeSlip, LogoTime, NoteTransaction, SafeDepositSlip, SafeDepositTransaction,
    CASH_COLLECTION,
};
use crate::source::{PuntoReceipt, RECEIPT_CHEQUE};
use crate::state::EntityKind;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Collection record as stored in the staging queue payload.
///
/// Field names are PascalCase so rows queued by earlier tooling decode too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CashReceipt {
    #[serde(default)]
    pub source_id: i64,
    pub receipt_no: String,
    pub receipt_date: NaiveDateTime,
    pub customer_code: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub cash_account_code: String,
    pub amount: Decimal,
    pub currency_code: String,
    pub exchange_rate: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub receipt_type: i32,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub cheque_no: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
}

impl CashReceipt {
    /// Staging record for a PUNTO collection row. Cheques are numbered
    /// `C.<NO>`, everything else `N.<NO>`.
    pub fn from_punto(row: &PuntoReceipt, cash_account: &str, today: NaiveDate) -> Self {
        let prefix = if row.receipt_type == RECEIPT_CHEQUE { "C" } else { "N" };
        Self {
            source_id: row.id,
            receipt_no: format!("{}.{}", prefix, row.no),
            receipt_date: row.date.unwrap_or_else(|| today.and_time(NaiveTime::default())),
            customer_code: row.customer_code.clone(),
            customer_name: row.customer_name.clone(),
            cash_account_code: cash_account.to_string(),
            amount: row.amount,
            currency_code: "TRY".to_string(),
            exchange_rate: Decimal::ONE,
            description: Some(row.note.clone().unwrap_or_default()),
            receipt_type: row.receipt_type,
            bank_name: row.bank_name.clone(),
            cheque_no: row.cheque_no.clone(),
            due_date: row.due_date,
        }
    }

    pub fn is_cheque(&self) -> bool {
        self.receipt_type == RECEIPT_CHEQUE
    }

    /// Queue the receipt is staged under.
    pub fn kind(&self) -> EntityKind {
        if self.is_cheque() {
            EntityKind::ChequeReceipt
        } else {
            EntityKind::CashReceipt
        }
    }

    fn is_local_currency(&self) -> bool {
        self.currency_code.eq_ignore_ascii_case("TRY")
    }
}

/// Cash collection into a safe deposit. The slip is stamped with the receipt
/// date and the current time of day.
pub fn build_safe_deposit_slip(
    receipt: &CashReceipt,
    now: NaiveDateTime,
    offset: &str,
) -> SafeDepositSlip {
    let stamp = receipt.receipt_date.date().and_time(now.time());
    let date = logo_datetime_millis(stamp, offset);
    let foreign = !receipt.is_local_currency();

    let line = SafeDepositTransaction {
        kind: CASH_COLLECTION,
        transaction_number: receipt.receipt_no.clone(),
        document_no: receipt.receipt_no.clone(),
        document_date: date.clone(),
        description: receipt.description.clone().unwrap_or_default(),
        arap_code: receipt.customer_code.clone(),
        customer_name: receipt.customer_name.clone().unwrap_or_default(),
        amount: receipt.amount,
        tc_type: currency_tc_type(&receipt.currency_code),
        amount_tc: if foreign { receipt.amount } else { Decimal::ZERO },
        tc_exchange_rate: if foreign { receipt.exchange_rate } else { Decimal::ZERO },
        vat_inclusive_amount: receipt.amount,
        ..Default::default()
    };

    SafeDepositSlip {
        date,
        hour: LogoTime::hm(stamp.hour(), stamp.minute()),
        pc_point_code: receipt.cash_account_code.clone(),
        safe_deposit_code: receipt.cash_account_code.clone(),
        transaction2: vec![line],
        ..Default::default()
    }
}

/// Customer cheque entry. The cheque number falls back to the receipt number
/// and the due date to the receipt date.
pub fn build_cheque_slip(receipt: &CashReceipt, settings: &ChequeConfig, offset: &str) -> ChequeSlip {
    let slip_date = logo_date(receipt.receipt_date.date(), offset);
    let due_date = logo_date(
        receipt.due_date.unwrap_or(receipt.receipt_date).date(),
        offset,
    );
    let cheque_no = receipt
        .cheque_no
        .clone()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| receipt.receipt_no.clone());
    let customer_name = receipt.customer_name.clone().unwrap_or_default();

    ChequeSlip {
        slip_date,
        org_unit: settings.org_unit.clone(),
        org_unit_description: settings.org_unit_description.clone(),
        arap_code: receipt.customer_code.clone(),
        arap_title: customer_name.clone(),
        note_transaction: vec![NoteTransaction {
            portfolio_no: cheque_no.clone(),
            serial_no: cheque_no,
            due_date: due_date.clone(),
            debtor: customer_name,
            bank_name: receipt.bank_name.clone().unwrap_or_default(),
            amount: receipt.amount,
            ..Default::default()
        }],
        notes: receipt.description.clone().unwrap_or_default(),
        total_local_currency: receipt.amount,
        averg_due_date: due_date,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn punto_row(receipt_type: i32) -> PuntoReceipt {
        PuntoReceipt {
            id: 501,
            no: 17,
            customer_code: "120.01.003".to_string(),
            customer_name: Some("ACAR TICARET".to_string()),
            date: Some(day(2026, 2, 10).and_hms_opt(0, 0, 0).unwrap()),
            amount: dec!(1250.50),
            note: None,
            receipt_type,
            salesperson_code: Some("P01".to_string()),
            bank_name: Some("ZIRAAT".to_string()),
            cheque_no: Some("CK-778".to_string()),
            due_date: Some(day(2026, 4, 30).and_hms_opt(0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_from_punto_prefixes_receipt_no() {
        let cash = CashReceipt::from_punto(&punto_row(0), "01", day(2026, 3, 1));
        assert_eq!(cash.receipt_no, "N.17");
        assert!(!cash.is_cheque());
        assert_eq!(cash.currency_code, "TRY");
        assert_eq!(cash.exchange_rate, Decimal::ONE);
        assert_eq!(cash.description.as_deref(), Some(""));

        let cheque = CashReceipt::from_punto(&punto_row(1), "01", day(2026, 3, 1));
        assert_eq!(cheque.receipt_no, "C.17");
        assert!(cheque.is_cheque());
        assert_eq!(cash.kind(), EntityKind::CashReceipt);
        assert_eq!(cheque.kind(), EntityKind::ChequeReceipt);
    }

    #[test]
    fn test_from_punto_defaults_missing_date_to_today() {
        let mut row = punto_row(0);
        row.date = None;
        let cash = CashReceipt::from_punto(&row, "02", day(2026, 3, 1));
        assert_eq!(cash.receipt_date, day(2026, 3, 1).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(cash.cash_account_code, "02");
    }

    #[test]
    fn test_payload_uses_pascal_case() {
        let cash = CashReceipt::from_punto(&punto_row(0), "01", day(2026, 3, 1));
        let v = serde_json::to_value(&cash).unwrap();
        assert_eq!(v["ReceiptNo"], "N.17");
        assert_eq!(v["CustomerCode"], "120.01.003");

        let legacy = r#"{"ReceiptNo":"N.5","ReceiptDate":"2026-01-05T00:00:00",
            "CustomerCode":"C1","CashAccountCode":"01","Amount":10.0,
            "CurrencyCode":"TRY","ExchangeRate":1,"ReceiptType":0}"#;
        let parsed: CashReceipt = serde_json::from_str(legacy).unwrap();
        assert_eq!(parsed.receipt_no, "N.5");
        assert_eq!(parsed.customer_name, None);
    }

    #[test]
    fn test_safe_deposit_slip_fields() {
        let cash = CashReceipt::from_punto(&punto_row(0), "01", day(2026, 3, 1));
        let now = day(2026, 3, 1).and_hms_milli_opt(9, 41, 7, 250).unwrap();
        let slip = build_safe_deposit_slip(&cash, now, "+03:00");
        let v = serde_json::to_value(&slip).unwrap();

        assert_eq!(v["date"], "2026-02-10T09:41:07.250+03:00");
        assert_eq!(v["hour"], json!({"hour": 9, "minute": 41, "second": 0, "milisecond": 0}));
        assert_eq!(v["pCPointCode"], "01");
        assert_eq!(v["safeDepositCode"], "01");
        assert_eq!(v["transaction"], json!([]));
        assert_eq!(v["extensions"], json!({"list": []}));

        let line = &v["transaction2"][0];
        assert_eq!(line["type"], 11);
        assert_eq!(line["transactionNumber"], "N.17");
        assert_eq!(line["documentNo"], "N.17");
        assert_eq!(line["documentDate"], "2026-02-10T09:41:07.250+03:00");
        assert_eq!(line["aRaPCode"], "120.01.003");
        assert_eq!(line["customerName"], "ACAR TICARET");
        assert_eq!(line["tcType"], 0);
        assert_eq!(line["amountTC"], 0.0);
        assert_eq!(line["tcExchangeRate"], 0.0);
        assert_eq!(line["amount"], 1250.5);
        assert_eq!(line["vatInclusiveAmount"], 1250.5);
        assert_eq!(line["noteTransaction"], json!([]));
    }

    #[test]
    fn test_safe_deposit_foreign_currency() {
        let mut cash = CashReceipt::from_punto(&punto_row(0), "01", day(2026, 3, 1));
        cash.currency_code = "EUR".to_string();
        cash.exchange_rate = dec!(37.25);
        let now = day(2026, 3, 1).and_hms_opt(10, 0, 0).unwrap();
        let slip = build_safe_deposit_slip(&cash, now, "+03:00");
        let line = &slip.transaction2[0];
        assert_eq!(line.tc_type, 20);
        assert_eq!(line.amount_tc, dec!(1250.50));
        assert_eq!(line.tc_exchange_rate, dec!(37.25));
    }

    #[test]
    fn test_cheque_slip_fields() {
        let cheque = CashReceipt::from_punto(&punto_row(1), "01", day(2026, 3, 1));
        let slip = build_cheque_slip(&cheque, &ChequeConfig::default(), "+03:00");
        let v = serde_json::to_value(&slip).unwrap();

        assert_eq!(v["slipDate"], "2026-02-10T00:00:00.000+03:00");
        assert_eq!(v["orgUnit"], "01");
        assert_eq!(v["orgUnitDescription"], "MERKEZ");
        assert_eq!(v["arapCode"], "120.01.003");
        assert_eq!(v["SalespersonCode"], "");
        assert_eq!(v["avergDueDate"], "2026-04-30T00:00:00.000+03:00");
        assert_eq!(v["numberofRecords"], 1.0);
        assert_eq!(v["remainingRate"], 100.0);
        assert_eq!(v["mainChartofAccounts"], "04");
        assert_eq!(v["mainChartofAccountsDesc"], "Günlük / Mahsup");
        assert_eq!(v["bankTransaction"], json!([{"index": 0}]));
        assert_eq!(v["analysisTransaction"], json!([{"index": 0}]));

        let note = &v["noteTransaction"][0];
        assert_eq!(note["portfolioNo"], "CK-778");
        assert_eq!(note["serialNo"], "CK-778");
        assert_eq!(note["bankName"], "ZIRAAT");
        assert_eq!(note["debtor"], "ACAR TICARET");
        assert_eq!(note["placeOfPayment"], "");
    }

    #[test]
    fn test_cheque_slip_fallbacks() {
        let mut row = punto_row(1);
        row.cheque_no = Some(String::new());
        row.due_date = None;
        let cheque = CashReceipt::from_punto(&row, "01", day(2026, 3, 1));
        let slip = build_cheque_slip(&cheque, &ChequeConfig::default(), "+03:00");
        assert_eq!(slip.note_transaction[0].serial_no, "C.17");
        assert_eq!(slip.averg_due_date, "2026-02-10T00:00:00.000+03:00");
    }
}

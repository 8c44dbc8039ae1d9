use super::logo_datetime_millis;
use crate::slips::{ArpSlip, ArpSlipTransaction};
use crate::source::PosReceipt;

/// Customer credit slip for a virtual POS collection, crossed against the
/// receiving bank account. `salesperson` is the translated Logo code.
pub fn build_arp_slip(pos: &PosReceipt, salesperson: &str, offset: &str) -> ArpSlip {
    ArpSlip {
        slip_date: logo_datetime_millis(pos.date, offset),
        slip_no: pos.document_no.clone(),
        doc_no: pos.fis_no.clone(),
        org_unit_code: pos.org_unit.clone(),
        footnote: pos.customer_name.clone(),
        slip_transaction: vec![ArpSlipTransaction {
            arp_info_code: pos.customer_code.clone(),
            arp_info_def: pos.customer_name.clone(),
            line_credit: pos.amount,
            payment_plan_code: pos.payment_plan_code.clone(),
            employee_code: salesperson.to_string(),
            cross_acc_code: pos.bank_account_code.clone(),
            cross_acc_def: pos.bank_account_name.clone(),
            ..Default::default()
        }],
        index: 0,
        serialize_nulls: false,
    }
}

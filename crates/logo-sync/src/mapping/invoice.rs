use super::{logo_date, logo_datetime, non_empty, SalespersonMap};
use crate::config::InvoiceConfig;
use crate::slips::{
    DispatchRef, Installment, InvoiceLine, LogoTime, SalesInvoice, DEFAULT_DISPATCH_TYPE,
};
use crate::source::{DispatchLine, DISPATCH_LINE_DISCOUNT};
use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use std::collections::HashSet;

/// All open dispatch lines of one customer; becomes one invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceGroup {
    pub customer_code: String,
    pub rows: Vec<DispatchLine>,
}

impl InvoiceGroup {
    pub fn material_rows(&self) -> impl Iterator<Item = &DispatchLine> {
        self.rows.iter().filter(|r| r.is_material())
    }

    /// Distinct non-empty dispatch numbers, in first-seen order.
    pub fn dispatch_numbers(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|r| non_empty(r.dispatch_no.as_deref()))
            .filter(|no| seen.insert(*no))
            .collect()
    }
}

/// Groups lines by customer, keeping customers in first-appearance order
/// and rows in their original order.
pub fn group_by_customer(lines: Vec<DispatchLine>) -> Vec<InvoiceGroup> {
    let mut groups: Vec<InvoiceGroup> = Vec::new();
    for line in lines {
        match groups
            .iter_mut()
            .find(|g| g.customer_code == line.customer_code)
        {
            Some(group) => group.rows.push(line),
            None => groups.push(InvoiceGroup {
                customer_code: line.customer_code.clone(),
                rows: vec![line],
            }),
        }
    }
    groups
}

/// Stock line refs to flag as billed once the invoice exists.
pub fn billed_line_refs(group: &InvoiceGroup) -> Vec<i64> {
    group.material_rows().map(|r| r.dispatch_line_ref).collect()
}

/// VAT-inclusive net total of the material rows, rounded half-to-even to
/// two places.
pub fn installment_total(group: &InvoiceGroup) -> Decimal {
    let hundred = Decimal::ONE_HUNDRED;
    let total: Decimal = group
        .material_rows()
        .map(|r| {
            let mut line = r.total;
            if r.discount_percent > Decimal::ZERO {
                line *= Decimal::ONE - r.discount_percent / hundred;
            }
            line * (Decimal::ONE + r.vat_rate / hundred)
        })
        .sum();
    total.round_dp(2)
}

/// Wholesale invoice closing every dispatch in `group`.
pub fn build_invoice(
    group: &InvoiceGroup,
    settings: &InvoiceConfig,
    salespeople: &SalespersonMap,
    now: NaiveDateTime,
    offset: &str,
) -> SalesInvoice {
    let Some(first) = group.rows.first() else {
        return SalesInvoice::default();
    };
    let now_str = logo_datetime(now, offset);
    let org_unit = non_empty(first.org_unit.as_deref())
        .unwrap_or(&settings.default_org_unit)
        .to_string();
    let warehouse = non_empty(first.warehouse.as_deref())
        .unwrap_or(&settings.default_warehouse)
        .to_string();
    let title = first.customer_name.clone().unwrap_or_default();
    let payment_plan = first.payment_plan.clone().unwrap_or_default();

    SalesInvoice {
        salesperson_code: salespeople.resolve(first.salesperson_code.as_deref().unwrap_or_default()),
        items: build_items(group, settings, salespeople, offset),
        dispatches: build_dispatches(group, offset),
        installments: build_installments(group, now, offset),
        date: now_str.clone(),
        time: LogoTime::hm(now.hour(), now.minute()),
        document_date: now_str,
        org_unit: org_unit.clone(),
        warehouse: warehouse.clone(),
        org_unit2: org_unit,
        warehouse2: warehouse,
        arap: group.customer_code.clone(),
        customer: group.customer_code.clone(),
        customer2: group.customer_code.clone(),
        code_ship_to: group.customer_code.clone(),
        arap_title: title.clone(),
        arap_title2: title.clone(),
        arap_title3: title.clone(),
        title,
        payment_plan: payment_plan.clone(),
        payment_plan2: payment_plan,
        reference_date: logo_date(now.date(), offset),
        ..Default::default()
    }
}

fn build_items(
    group: &InvoiceGroup,
    settings: &InvoiceConfig,
    salespeople: &SalespersonMap,
    offset: &str,
) -> Vec<InvoiceLine> {
    let mut items = Vec::new();
    for row in &group.rows {
        let salesperson = salespeople.resolve(row.salesperson_code.as_deref().unwrap_or_default());
        let warehouse = non_empty(row.warehouse.as_deref())
            .unwrap_or(&settings.default_warehouse)
            .to_string();

        if row.is_material() {
            let line_plan = match row.line_payment_plan.as_deref() {
                None | Some("NULL") => String::new(),
                Some(plan) => plan.to_string(),
            };
            items.push(InvoiceLine {
                logical_ref: row.dispatch_line_ref,
                order_trans_ref: row.order_line_ref,
                order_slip_ref: row.order_ref,
                dispatch_ref: row.dispatch_ref,
                dispatch_trans_ref: row.order_line_ref,
                code: row.product_code.clone().unwrap_or_default(),
                quantity: row.quantity,
                unit_code: row.unit.clone().unwrap_or_else(|| "ADET".to_string()),
                unit_price: row.price,
                currency_pc: row.price_currency,
                vatrate_percent: row.vat_rate,
                amount: row.total,
                net_amount: row.total,
                apply_discount_trans_value: row.total,
                order_slip_number: row.order_no.clone().unwrap_or_default(),
                order_date: row
                    .order_date
                    .map(|d| logo_datetime(d, offset))
                    .unwrap_or_default(),
                dispatch_no: row.dispatch_no.clone().unwrap_or_default(),
                payment_plan: line_plan,
                purchase_employee_salesperson_code: salesperson.clone(),
                warehouse: warehouse.clone(),
                ..Default::default()
            });
            if row.discount_percent > Decimal::ZERO {
                items.push(discount_item(row, salesperson, warehouse));
            }
        } else if row.line_type == DISPATCH_LINE_DISCOUNT {
            items.push(discount_item(row, salesperson, warehouse));
        }
    }
    items
}

fn discount_item(row: &DispatchLine, salesperson: String, warehouse: String) -> InvoiceLine {
    InvoiceLine {
        deep: true,
        kind: DISPATCH_LINE_DISCOUNT,
        code: row.product_code.clone().unwrap_or_default(),
        vatrate_percent: row.vat_rate,
        percent: row.discount_percent,
        purchase_employee_salesperson_code: salesperson,
        warehouse,
        ..Default::default()
    }
}

fn build_dispatches(group: &InvoiceGroup, offset: &str) -> Vec<DispatchRef> {
    group
        .dispatch_numbers()
        .into_iter()
        .filter_map(|no| {
            let first = group
                .rows
                .iter()
                .find(|r| r.dispatch_no.as_deref() == Some(no))?;
            let date = logo_datetime(first.dispatch_date, offset);
            Some(DispatchRef {
                kind: if first.slip_type > 0 {
                    first.slip_type
                } else {
                    DEFAULT_DISPATCH_TYPE
                },
                number: no.to_string(),
                date: date.clone(),
                document_date: date,
                index: 0,
                serialize_nulls: false,
            })
        })
        .collect()
}

fn build_installments(group: &InvoiceGroup, now: NaiveDateTime, offset: &str) -> Vec<Installment> {
    let Some(first) = group.material_rows().next() else {
        return Vec::new();
    };
    let due = logo_date(first.payment_date.unwrap_or(now).date(), offset);
    vec![Installment {
        payment_no: "1".to_string(),
        date: due.clone(),
        option_date: due.clone(),
        amount: installment_total(group),
        status: "1".to_string(),
        discount_validation: due,
        index: 0,
        serialize_nulls: false,
    }]
}

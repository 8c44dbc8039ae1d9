use super::{Extensions, LogoTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dispatch slip type used when the view reports none.
pub const DEFAULT_DISPATCH_TYPE: i32 = 8;

/// `POST invoices/sales?invoiceType=8` body: a wholesale invoice built from
/// one customer's open dispatch lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesInvoice {
    pub salesperson_code: String,
    #[serde(rename = "itemTransactionDTO")]
    pub items: Vec<InvoiceLine>,
    #[serde(rename = "masterDataDispatcDTO")]
    pub dispatches: Vec<DispatchRef>,
    #[serde(rename = "eWayInfoDetailsDTO")]
    pub eway_info_details: Vec<serde_json::Value>,
    #[serde(rename = "installmentDTO")]
    pub installments: Vec<Installment>,
    pub bo_status: i32,
    pub serial_order_no_part1: String,
    pub serial_order_no_part2: String,
    pub date: String,
    pub time: LogoTime,
    pub document_date: String,
    pub org_unit: String,
    pub warehouse: String,
    pub arap: String,
    #[serde(rename = "araptitle")]
    pub arap_title: String,
    #[serde(rename = "araptitle2")]
    pub arap_title2: String,
    #[serde(rename = "araptitle3")]
    pub arap_title3: String,
    pub payment_plan: String,
    pub payment_plan2: String,
    #[serde(rename = "eInvoice2")]
    pub e_invoice2: bool,
    pub electronic_document: bool,
    pub electronic_document3: bool,
    pub customer: String,
    pub customer2: String,
    pub general_currency: i32,
    pub lines_currency: i32,
    pub reference_date: String,
    pub remaining_rate: Decimal,
    #[serde(rename = "mainChartofAccounts")]
    pub main_chart_of_accounts: String,
    #[serde(rename = "mainChartofAccountsDesc")]
    pub main_chart_of_accounts_desc: String,
    pub distribute_discounts: bool,
    pub distribute_promotions: bool,
    pub distribute_expenses: bool,
    pub distribute_reverse_charge: bool,
    pub code_ship_to: String,
    pub scenario2: i32,
    pub substitutes_dispatch_receipt: bool,
    #[serde(rename = "orgunit2")]
    pub org_unit2: String,
    pub warehouse2: String,
    pub reverse_charge_applicability: i32,
    #[serde(rename = "applicablePercentofTaxRate")]
    pub applicable_percent_of_tax_rate: Decimal,
    pub title: String,
    pub edispatch_details: Vec<serde_json::Value>,
    pub extensions: Extensions,
    pub index: i32,
    pub serialize_nulls: bool,
}

impl Default for SalesInvoice {
    fn default() -> Self {
        Self {
            salesperson_code: String::new(),
            items: Vec::new(),
            dispatches: Vec::new(),
            eway_info_details: Vec::new(),
            installments: Vec::new(),
            bo_status: 1,
            serial_order_no_part1: "PNT".to_string(),
            serial_order_no_part2: "GUNCELLE".to_string(),
            date: String::new(),
            time: LogoTime::default(),
            document_date: String::new(),
            org_unit: String::new(),
            warehouse: String::new(),
            arap: String::new(),
            arap_title: String::new(),
            arap_title2: String::new(),
            arap_title3: String::new(),
            payment_plan: String::new(),
            payment_plan2: String::new(),
            e_invoice2: true,
            electronic_document: true,
            electronic_document3: true,
            customer: String::new(),
            customer2: String::new(),
            general_currency: 1,
            lines_currency: 1,
            reference_date: String::new(),
            remaining_rate: Decimal::ONE_HUNDRED,
            main_chart_of_accounts: "04".to_string(),
            main_chart_of_accounts_desc: "Günlük / Mahsup".to_string(),
            distribute_discounts: true,
            distribute_promotions: true,
            distribute_expenses: false,
            distribute_reverse_charge: true,
            code_ship_to: String::new(),
            scenario2: 1,
            substitutes_dispatch_receipt: true,
            org_unit2: String::new(),
            warehouse2: String::new(),
            reverse_charge_applicability: -1,
            applicable_percent_of_tax_rate: Decimal::ONE_HUNDRED,
            title: String::new(),
            edispatch_details: Vec::new(),
            extensions: Extensions::default(),
            index: 0,
            serialize_nulls: false,
        }
    }
}

/// One `itemTransactionDTO` row. Material rows carry the dispatch and order
/// references; discount rows (`deep = true`) carry only a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub deep: bool,
    #[serde(rename = "type")]
    pub kind: i32,
    pub logical_ref: i64,
    pub source_ref: i64,
    pub order_trans_ref: i64,
    pub order_slip_ref: i64,
    pub dispatch_ref: i64,
    pub dispatch_trans_ref: i64,
    pub code: String,
    pub quantity: Decimal,
    pub unit_code: String,
    pub unit_price: Decimal,
    #[serde(rename = "currencyTypeRC")]
    pub currency_type_rc: i32,
    #[serde(rename = "currencyPC")]
    pub currency_pc: i32,
    pub percent: Decimal,
    pub vatrate_percent: Decimal,
    pub amount: Decimal,
    pub net_amount: Decimal,
    pub cost_type: i32,
    pub order_slip_number: String,
    pub order_date: String,
    pub payment_plan: String,
    pub purchase_employee_salesperson_code: String,
    pub warehouse: String,
    pub distribution_type: i32,
    pub dispatch_no: String,
    pub foreign_trade_type: i32,
    pub apply_discount_trans_value: Decimal,
    pub unit_conversion: Decimal,
    pub unit_conversion1: Decimal,
    pub analysis_dim_lines: Vec<serde_json::Value>,
    pub sl_details_transaction: Vec<serde_json::Value>,
    pub med_device_detail_transaction: Vec<serde_json::Value>,
    pub extensions: Extensions,
    pub index: i32,
    pub serialize_nulls: bool,
}

impl Default for InvoiceLine {
    fn default() -> Self {
        Self {
            deep: false,
            kind: 0,
            logical_ref: 0,
            source_ref: 0,
            order_trans_ref: 0,
            order_slip_ref: 0,
            dispatch_ref: 0,
            dispatch_trans_ref: 0,
            code: String::new(),
            quantity: Decimal::ZERO,
            unit_code: String::new(),
            unit_price: Decimal::ZERO,
            currency_type_rc: 1,
            currency_pc: 0,
            percent: Decimal::ZERO,
            vatrate_percent: Decimal::ZERO,
            amount: Decimal::ZERO,
            net_amount: Decimal::ZERO,
            cost_type: -1,
            order_slip_number: String::new(),
            order_date: String::new(),
            payment_plan: String::new(),
            purchase_employee_salesperson_code: String::new(),
            warehouse: String::new(),
            distribution_type: -1,
            dispatch_no: String::new(),
            foreign_trade_type: -1,
            apply_discount_trans_value: Decimal::ZERO,
            unit_conversion: Decimal::ONE,
            unit_conversion1: Decimal::ONE,
            analysis_dim_lines: Vec::new(),
            sl_details_transaction: Vec::new(),
            med_device_detail_transaction: Vec::new(),
            extensions: Extensions::default(),
            index: 0,
            serialize_nulls: false,
        }
    }
}

/// A dispatch note the invoice closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRef {
    #[serde(rename = "type")]
    pub kind: i32,
    pub number: String,
    pub date: String,
    #[serde(rename = "documenDate")]
    pub document_date: String,
    pub index: i32,
    pub serialize_nulls: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub payment_no: String,
    pub date: String,
    pub option_date: String,
    pub amount: Decimal,
    pub status: String,
    pub discount_validation: String,
    pub index: i32,
    pub serialize_nulls: bool,
}

/// `PUT invoices/sales/applyCampaign` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyCampaignRequest {
    pub no: String,
    pub date: String,
    #[serde(rename = "orgUnit")]
    pub org_unit: String,
    pub warehouse: String,
    pub arap: String,
}

impl ApplyCampaignRequest {
    /// Campaign request for the invoice J-Platform just numbered `code`.
    pub fn for_invoice(code: &str, invoice: &SalesInvoice) -> Self {
        Self {
            no: code.to_string(),
            date: invoice.date.clone(),
            org_unit: invoice.org_unit.clone(),
            warehouse: invoice.warehouse.clone(),
            arap: invoice.arap.clone(),
        }
    }
}

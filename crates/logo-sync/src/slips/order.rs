use super::{is_false, is_zero, Extensions, LogoTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order line type for a material (stock item) row.
pub const LINE_MATERIAL: i32 = 0;
/// Order line type for a percentage discount row.
pub const LINE_DISCOUNT: i32 = 2;

/// `POST salesOrder` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrderSlip {
    #[serde(rename = "orderDiscountDTO")]
    pub lines: Vec<OrderLine>,
    pub no: String,
    pub date: String,
    pub time: LogoTime,
    pub document_no: String,
    pub document_date: String,
    pub org_unit: String,
    pub warehouse: String,
    pub arap: String,
    pub salesperson_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_plan: Option<String>,
    pub code4: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_tracking: Option<String>,
    pub pre_payment: bool,
    #[serde(rename = "shipmentAddressasInvoiceAddress")]
    pub shipment_address_as_invoice_address: bool,
    pub reverse_charge_applicability: i32,
    #[serde(rename = "shipmentAddressasInvoiceAddress2")]
    pub shipment_address_as_invoice_address2: bool,
    pub einvoice: bool,
    pub earchive: bool,
    pub online_sales_invoice: bool,
    pub installation_number: String,
    pub sending_date: String,
    pub refresh_order_number: bool,
    pub campaign_refs: Vec<serde_json::Value>,
    pub extensions: Extensions,
    pub index: i32,
    pub serialize_nulls: bool,
}

impl Default for SalesOrderSlip {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            no: String::new(),
            date: String::new(),
            time: LogoTime::default(),
            document_no: String::new(),
            document_date: String::new(),
            org_unit: String::new(),
            warehouse: String::new(),
            arap: String::new(),
            salesperson_code: String::new(),
            payment_plan: None,
            code4: String::new(),
            document_tracking: None,
            pre_payment: false,
            shipment_address_as_invoice_address: false,
            reverse_charge_applicability: -1,
            shipment_address_as_invoice_address2: false,
            einvoice: false,
            earchive: false,
            online_sales_invoice: false,
            installation_number: String::new(),
            sending_date: String::new(),
            refresh_order_number: false,
            campaign_refs: Vec::new(),
            extensions: Extensions::default(),
            index: 0,
            serialize_nulls: false,
        }
    }
}

/// One `orderDiscountDTO` entry: either a material row or a discount row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(rename = "orderAnalysisDTO")]
    pub analysis: Vec<OrderAnalysis>,
    pub deep: bool,
    #[serde(rename = "type")]
    pub kind: i32,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: Decimal,
    pub undelivered_quantity: Decimal,
    pub unit: i32,
    pub unit_code: String,
    pub unit_price: Decimal,
    #[serde(rename = "currencyTypeRC")]
    pub currency_type_rc: i32,
    pub vatrate_percent: Decimal,
    #[serde(rename = "vatincluded", default, skip_serializing_if = "is_false")]
    pub vat_included: bool,
    pub net_discount: bool,
    pub gst_included: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub percent: Decimal,
    pub additional_tax_included: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procurement_date: Option<String>,
    pub reserved: bool,
    pub status: i32,
    pub purchase_employee_salesperson_code: String,
    pub warehouse: String,
    pub subject_to_inspection: bool,
    pub index: i32,
    pub serialize_nulls: bool,
}

impl Default for OrderLine {
    fn default() -> Self {
        Self {
            analysis: vec![OrderAnalysis::default()],
            deep: false,
            kind: LINE_MATERIAL,
            code: String::new(),
            description: None,
            quantity: Decimal::ZERO,
            undelivered_quantity: Decimal::ZERO,
            unit: 0,
            unit_code: String::new(),
            unit_price: Decimal::ZERO,
            currency_type_rc: 1,
            vatrate_percent: Decimal::ZERO,
            vat_included: false,
            net_discount: false,
            gst_included: false,
            amount: Decimal::ZERO,
            percent: Decimal::ZERO,
            additional_tax_included: false,
            procurement_date: None,
            reserved: false,
            status: 1,
            purchase_employee_salesperson_code: String::new(),
            warehouse: String::new(),
            subject_to_inspection: false,
            index: 0,
            serialize_nulls: false,
        }
    }
}

/// Empty analysis-dimension row the order endpoint expects on every line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAnalysis {
    pub analysis_dimension_code: String,
    pub analysis_dimension_description: String,
    pub project_code: String,
    pub project_description: String,
    pub project_activity_code: String,
    pub project_activity_description: String,
    pub distribution_rate: Decimal,
    pub amount: Decimal,
    #[serde(rename = "amountRC")]
    pub amount_rc: Decimal,
    #[serde(rename = "amountTC")]
    pub amount_tc: Decimal,
    pub index: i32,
    pub serialize_nulls: bool,
}

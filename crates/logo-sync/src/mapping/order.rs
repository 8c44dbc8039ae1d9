use super::{derive_document_tracking, derive_org_unit, derive_warehouse, logo_datetime};
use crate::slips::{LogoTime, OrderLine, SalesOrderSlip, LINE_DISCOUNT, LINE_MATERIAL};
use crate::source::{PuntoOrder, PuntoOrderLine};
use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;

const UNIT_PIECE: i32 = 29;
const DEFAULT_VAT_PERCENT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Sales order for one PUNTO order header and its lines.
///
/// `salesperson` must already be translated to a Logo code. The org unit and
/// warehouse are derived from the order's depot under `division`.
pub fn build_sales_order(
    order: &PuntoOrder,
    lines: &[PuntoOrderLine],
    salesperson: Option<&str>,
    payment_plan: Option<&str>,
    division: &str,
    now: NaiveDateTime,
    offset: &str,
) -> SalesOrderSlip {
    let date = logo_datetime(order.order_date.date().and_time(now.time()), offset);
    let now_str = logo_datetime(now, offset);
    let warehouse = derive_warehouse(order.depot.as_deref(), division).unwrap_or_default();
    let org_unit = derive_org_unit(order.depot.as_deref(), division).unwrap_or_default();
    let salesperson = salesperson.unwrap_or_default().to_string();

    let mut order_lines = Vec::with_capacity(lines.len());
    for line in lines {
        order_lines.push(OrderLine {
            kind: LINE_MATERIAL,
            code: line.product_code.clone(),
            quantity: line.quantity,
            undelivered_quantity: line.quantity,
            unit: UNIT_PIECE,
            unit_code: line.unit.clone().unwrap_or_else(|| "ADET".to_string()),
            unit_price: line.unit_price,
            vatrate_percent: DEFAULT_VAT_PERCENT,
            amount: line.unit_price * line.quantity,
            procurement_date: Some(date.clone()),
            purchase_employee_salesperson_code: salesperson.clone(),
            warehouse: warehouse.clone(),
            ..Default::default()
        });

        let discounts = [
            line.discount3,
            line.discount4,
            line.discount_campaign,
            line.discount_mobile,
        ];
        for percent in discounts.into_iter().flatten() {
            if percent > Decimal::ZERO {
                order_lines.push(discount_line(percent, &salesperson, &warehouse));
            }
        }
    }

    SalesOrderSlip {
        lines: order_lines,
        no: order.fis_no.clone(),
        date,
        time: LogoTime::hm(now.hour(), now.minute()),
        document_no: order.document_no.clone().unwrap_or_default(),
        document_date: now_str.clone(),
        org_unit,
        warehouse,
        arap: order.customer_code.clone(),
        salesperson_code: salesperson,
        payment_plan: payment_plan.map(str::to_string),
        code4: order.customer_code.clone(),
        document_tracking: derive_document_tracking(&order.fis_no),
        sending_date: now_str,
        ..Default::default()
    }
}

fn discount_line(percent: Decimal, salesperson: &str, warehouse: &str) -> OrderLine {
    OrderLine {
        kind: LINE_DISCOUNT,
        code: "<..>".to_string(),
        description: Some(String::new()),
        percent,
        purchase_employee_salesperson_code: salesperson.to_string(),
        warehouse: warehouse.to_string(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn order() -> PuntoOrder {
        PuntoOrder {
            id: 88,
            no: Some("42".to_string()),
            customer_code: "120.05.010".to_string(),
            customer_name: Some("YILDIZ MARKET".to_string()),
            document_no: None,
            order_date: NaiveDate::from_ymd_opt(2026, 2, 3)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            salesperson_code: Some("P01".to_string()),
            fis_no: "S0012345".to_string(),
            depot: Some("7".to_string()),
            note: None,
        }
    }

    fn line(discount3: Option<Decimal>, campaign: Option<Decimal>) -> PuntoOrderLine {
        PuntoOrderLine {
            id: 1,
            product_code: "MLZ-001".to_string(),
            quantity: dec!(12),
            unit_price: dec!(2.5),
            unit: None,
            discount3,
            discount4: Some(Decimal::ZERO),
            discount_campaign: campaign,
            discount_mobile: None,
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 5)
            .unwrap()
            .and_hms_opt(16, 20, 45)
            .unwrap()
    }

    #[test]
    fn test_header_fields() {
        let slip = build_sales_order(
            &order(),
            &[line(None, None)],
            Some("S.001"),
            Some("PP30"),
            "01",
            now(),
            "+03:00",
        );
        let v = serde_json::to_value(&slip).unwrap();

        assert_eq!(v["no"], "S0012345");
        assert_eq!(v["date"], "2026-02-03T16:20:45.000+03:00");
        assert_eq!(v["documentDate"], "2026-02-05T16:20:45.000+03:00");
        assert_eq!(v["sendingDate"], "2026-02-05T16:20:45.000+03:00");
        assert_eq!(v["time"], json!({"hour": 16, "minute": 20, "second": 0, "milisecond": 0}));
        assert_eq!(v["documentNo"], "");
        assert_eq!(v["orgUnit"], "01.7");
        assert_eq!(v["warehouse"], "01.7.7");
        assert_eq!(v["arap"], "120.05.010");
        assert_eq!(v["code4"], "120.05.010");
        assert_eq!(v["salespersonCode"], "S.001");
        assert_eq!(v["paymentPlan"], "PP30");
        assert_eq!(v["documentTracking"], "0012345");
        assert_eq!(v["reverseChargeApplicability"], -1);
        assert_eq!(v["einvoice"], false);
        assert_eq!(v["campaignRefs"], json!([]));
    }

    #[test]
    fn test_missing_payment_plan_is_omitted() {
        let slip = build_sales_order(&order(), &[], None, None, "01", now(), "+03:00");
        let v = serde_json::to_value(&slip).unwrap();
        assert!(v.get("paymentPlan").is_none());
        assert_eq!(v["salespersonCode"], "");
    }

    #[test]
    fn test_material_line() {
        let slip = build_sales_order(&order(), &[line(None, None)], Some("S.001"), None, "01", now(), "+03:00");
        assert_eq!(slip.lines.len(), 1);
        let v = serde_json::to_value(&slip.lines[0]).unwrap();
        assert_eq!(v["type"], 0);
        assert_eq!(v["code"], "MLZ-001");
        assert_eq!(v["unit"], 29);
        assert_eq!(v["unitCode"], "ADET");
        assert_eq!(v["amount"], 30.0);
        assert_eq!(v["undeliveredQuantity"], 12.0);
        assert_eq!(v["vatratePercent"], 20.0);
        assert_eq!(v["procurementDate"], "2026-02-03T16:20:45.000+03:00");
        assert_eq!(v["warehouse"], "01.7.7");
        assert_eq!(v["purchaseEmployeeSalespersonCode"], "S.001");
        assert!(v.get("percent").is_none());
        assert!(v.get("vatincluded").is_none());
        assert!(v.get("description").is_none());
        assert_eq!(v["orderAnalysisDTO"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_discount_lines_follow_material_in_order() {
        let slip = build_sales_order(
            &order(),
            &[line(Some(dec!(5)), Some(dec!(2.5)))],
            None,
            None,
            "01",
            now(),
            "+03:00",
        );
        assert_eq!(slip.lines.len(), 3);
        assert_eq!(slip.lines[1].kind, LINE_DISCOUNT);
        assert_eq!(slip.lines[1].percent, dec!(5));
        assert_eq!(slip.lines[2].percent, dec!(2.5));

        let v = serde_json::to_value(&slip.lines[1]).unwrap();
        assert_eq!(v["code"], "<..>");
        assert_eq!(v["description"], "");
        assert_eq!(v["unitCode"], "");
        assert!(v.get("amount").is_none());
    }
}

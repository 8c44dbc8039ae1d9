//! [`SourceReader`] over the PUNTO tables and views.
//!
//! PUNTO stores most numbers and dates in loosely typed columns. Every
//! column is normalised with `CAST`/`TRY_CAST` in SQL so a malformed value
//! arrives as NULL instead of failing the whole batch.

use super::{
    DispatchLine, MssqlPool, PosReceipt, PuntoOrder, PuntoOrderLine, PuntoReceipt, SourceReader,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::sync::Arc;
use tiberius::{Query, Row};
use tracing::debug;

/// Transfer flag PUNTO uses for rows handed over to Logo.
const TRANSFERRED: i32 = 50;

/// SQL Server accepts 2100 parameters per statement.
const MAX_IN_LIST: usize = 1000;

const PENDING_RECEIPTS: &str = r#"
    SELECT TOP (@P1)
        CAST([ID] AS BIGINT),
        ISNULL(TRY_CAST([NO] AS BIGINT), 0),
        CAST([CARI_KODU] AS NVARCHAR(50)),
        CAST([CARI_UNVANI] AS NVARCHAR(250)),
        TRY_CAST([TARIH] AS DATETIME2),
        ISNULL(TRY_CAST([TUTAR] AS DECIMAL(19, 4)), 0),
        CAST([NOT] AS NVARCHAR(MAX)),
        ISNULL(TRY_CAST([TAHSILAT_TIPI] AS INT), 0),
        CAST([PLASIYER_KODU] AS NVARCHAR(50)),
        CAST([BANKA_ADI] AS NVARCHAR(100)),
        CAST([CEK_SENET_NO] AS NVARCHAR(50)),
        TRY_CAST([VADE_TARIHI] AS DATETIME2)
    FROM [dbo].[ERYAZ_TAHSILAT]
    WHERE [TAHSILAT_TIPI] IN (0, 1)
      AND ([AKTARIM] IS NULL OR [AKTARIM] <> 50)
      AND [TUTAR] > 0
      AND [TARIH] IS NOT NULL
      AND [CARI_KODU] IS NOT NULL
    ORDER BY [ID]
"#;

const PENDING_ORDERS: &str = r#"
    SELECT TOP (@P1)
        CAST([ID] AS BIGINT),
        CAST([NO] AS NVARCHAR(50)),
        CAST([CARI_KODU] AS NVARCHAR(50)),
        CAST([CARI_UNVANI] AS NVARCHAR(250)),
        CAST([BELGE_NO] AS NVARCHAR(50)),
        TRY_CAST([SIPARIS_TARIHI] AS DATETIME2),
        CAST([TEMSILCI_KODU] AS NVARCHAR(50)),
        CAST([FIS_NO] AS NVARCHAR(50)),
        CAST([DEPO] AS NVARCHAR(20)),
        CAST([SIPARIS_NOTU] AS NVARCHAR(MAX))
    FROM [dbo].[ERYAZ_SIPARISLER]
    WHERE [AKTARIM] IS NULL
      AND TRY_CAST([SIPARIS_TARIHI] AS DATETIME2) >= @P2
      AND [CARI_KODU] IS NOT NULL
      AND [FIS_NO] IS NOT NULL
    ORDER BY [ID]
"#;

const ORDER_LINES: &str = r#"
    SELECT
        CAST([ID] AS BIGINT),
        ISNULL(CAST([URUN_KODU] AS NVARCHAR(50)), ''),
        ISNULL(TRY_CAST([MIKTAR] AS DECIMAL(19, 4)), 0),
        ISNULL(TRY_CAST([BIRIM_FIYAT] AS DECIMAL(19, 4)), 0),
        CAST([BIRIM] AS NVARCHAR(20)),
        TRY_CAST([ISK3] AS DECIMAL(9, 4)),
        TRY_CAST([ISK4] AS DECIMAL(9, 4)),
        TRY_CAST([ISK_KAMPANYA] AS DECIMAL(9, 4)),
        TRY_CAST([ISK_CEP] AS DECIMAL(9, 4))
    FROM [dbo].[ERYAZ_SIPARIS_DETAY]
    WHERE [FIS_NO] = @P1
    ORDER BY [ID]
"#;

const PENDING_POS: &str = r#"
    SELECT TOP (@P1)
        CAST([ID] AS BIGINT),
        ISNULL(CAST([BELGE_NO] AS NVARCHAR(50)), ''),
        TRY_CAST([TARIH] AS DATETIME2),
        ISNULL(CAST([CARI_KODU] AS NVARCHAR(50)), ''),
        ISNULL(CAST([CARI_UNVANI] AS NVARCHAR(250)), ''),
        ISNULL(CAST([FISNO] AS NVARCHAR(50)), ''),
        ISNULL(TRY_CAST([TUTAR] AS DECIMAL(19, 4)), 0),
        ISNULL(CAST([PLASIYER_KODU] AS NVARCHAR(50)), ''),
        ISNULL(CAST([ORGANIZASYON] AS NVARCHAR(50)), ''),
        ISNULL(CAST([BANKA_HESAP_KODU] AS NVARCHAR(50)), ''),
        ISNULL(CAST([BANKA_HESAP_ACIKLAMA] AS NVARCHAR(250)), ''),
        ISNULL(CAST([ODEME_PLANI_KODU] AS NVARCHAR(50)), '')
    FROM [dbo].[PNTV_ERYAZ_SANALPOS_AKTILACAKLAR]
"#;

const PENDING_DISPATCH_LINES: &str = r#"
    SELECT
        CAST([IRSALIYE_NO] AS NVARCHAR(50)),
        ISNULL(TRY_CAST([IRSALIYE_REF] AS BIGINT), 0),
        TRY_CAST([IRSALIYE_TARIHI] AS DATETIME2),
        ISNULL(TRY_CAST([IRSALIYE_SATIR_REF] AS BIGINT), 0),
        CAST([SIPARIS_NO] AS NVARCHAR(50)),
        TRY_CAST([SIPARIS_TARIHI] AS DATETIME2),
        ISNULL(TRY_CAST([SIPARIS_REF] AS BIGINT), 0),
        ISNULL(TRY_CAST([SIPARIS_SATIR_REF] AS BIGINT), 0),
        ISNULL(TRY_CAST([MIKTAR] AS DECIMAL(19, 4)), 0),
        ISNULL(TRY_CAST([FIYAT] AS DECIMAL(19, 4)), 0),
        ISNULL(TRY_CAST([FIYAT_KUR] AS INT), 0),
        ISNULL(CAST([CARI_KOD] AS NVARCHAR(50)), ''),
        CAST([CARI] AS NVARCHAR(250)),
        CAST([URUN_KODU] AS NVARCHAR(50)),
        TRY_CAST([ODEME_TARIHI] AS DATETIME2),
        CAST([ODEME_PLANI] AS NVARCHAR(50)),
        CAST([SATIR_ODEME_PLANI] AS NVARCHAR(50)),
        CAST([ISYERI] AS NVARCHAR(50)),
        CAST([AMBAR] AS NVARCHAR(50)),
        CAST([BIRIM] AS NVARCHAR(20)),
        CAST([SATIS_ELEMANI] AS NVARCHAR(50)),
        ISNULL(TRY_CAST([LINETYPE] AS INT), 0),
        ISNULL(TRY_CAST([SLIPTYPE] AS INT), 0),
        ISNULL(TRY_CAST([TOTAL] AS DECIMAL(19, 4)), 0),
        ISNULL(TRY_CAST([DISCPER] AS DECIMAL(9, 4)), 0),
        ISNULL(TRY_CAST([VATRATE] AS DECIMAL(9, 4)), 0)
    FROM [dbo].[PNTV_005_IrsaliyeDetay_Faturala]
    WHERE [BILLED] = 0
      AND [BILLSTATUS] = 0
    ORDER BY [CARI_KOD], [IRSALIYE_NO], [DETAILLINENR]
"#;

/// Reads pending work from PUNTO and flags it once delivered.
pub struct PuntoReader {
    pool: Arc<MssqlPool>,
}

impl PuntoReader {
    pub fn new(pool: Arc<MssqlPool>) -> Self {
        Self { pool }
    }

    async fn query_rows(&self, query: Query<'_>) -> Result<Vec<Row>> {
        let mut conn = self.pool.get_client().await?;
        let stream = query.query(&mut *conn).await?;
        Ok(stream.into_first_result().await?)
    }
}

fn text(row: &Row, idx: usize) -> Option<String> {
    row.get::<&str, _>(idx).map(str::to_string)
}

fn decimal(row: &Row, idx: usize) -> Decimal {
    row.get::<Decimal, _>(idx).unwrap_or_default()
}

fn receipt_from_row(row: &Row) -> PuntoReceipt {
    PuntoReceipt {
        id: row.get::<i64, _>(0).unwrap_or_default(),
        no: row.get::<i64, _>(1).unwrap_or_default(),
        customer_code: text(row, 2).unwrap_or_default(),
        customer_name: text(row, 3),
        date: row.get::<NaiveDateTime, _>(4),
        amount: decimal(row, 5),
        note: text(row, 6),
        receipt_type: row.get::<i32, _>(7).unwrap_or_default(),
        salesperson_code: text(row, 8),
        bank_name: text(row, 9),
        cheque_no: text(row, 10),
        due_date: row.get::<NaiveDateTime, _>(11),
    }
}

fn order_from_row(row: &Row) -> Option<PuntoOrder> {
    Some(PuntoOrder {
        id: row.get::<i64, _>(0)?,
        no: text(row, 1),
        customer_code: text(row, 2)?,
        customer_name: text(row, 3),
        document_no: text(row, 4),
        order_date: row.get::<NaiveDateTime, _>(5)?,
        salesperson_code: text(row, 6),
        fis_no: text(row, 7)?,
        depot: text(row, 8),
        note: text(row, 9),
    })
}

fn order_line_from_row(row: &Row) -> PuntoOrderLine {
    PuntoOrderLine {
        id: row.get::<i64, _>(0).unwrap_or_default(),
        product_code: text(row, 1).unwrap_or_default(),
        quantity: decimal(row, 2),
        unit_price: decimal(row, 3),
        unit: text(row, 4),
        discount3: row.get::<Decimal, _>(5),
        discount4: row.get::<Decimal, _>(6),
        discount_campaign: row.get::<Decimal, _>(7),
        discount_mobile: row.get::<Decimal, _>(8),
    }
}

fn pos_from_row(row: &Row) -> Option<PosReceipt> {
    Some(PosReceipt {
        id: row.get::<i64, _>(0)?,
        document_no: text(row, 1).unwrap_or_default(),
        date: row.get::<NaiveDateTime, _>(2)?,
        customer_code: text(row, 3).unwrap_or_default(),
        customer_name: text(row, 4).unwrap_or_default(),
        fis_no: text(row, 5).unwrap_or_default(),
        amount: decimal(row, 6),
        salesperson_code: text(row, 7).unwrap_or_default(),
        org_unit: text(row, 8).unwrap_or_default(),
        bank_account_code: text(row, 9).unwrap_or_default(),
        bank_account_name: text(row, 10).unwrap_or_default(),
        payment_plan_code: text(row, 11).unwrap_or_default(),
    })
}

fn dispatch_line_from_row(row: &Row) -> Option<DispatchLine> {
    Some(DispatchLine {
        dispatch_no: text(row, 0),
        dispatch_ref: row.get::<i64, _>(1).unwrap_or_default(),
        dispatch_date: row.get::<NaiveDateTime, _>(2)?,
        dispatch_line_ref: row.get::<i64, _>(3).unwrap_or_default(),
        order_no: text(row, 4),
        order_date: row.get::<NaiveDateTime, _>(5),
        order_ref: row.get::<i64, _>(6).unwrap_or_default(),
        order_line_ref: row.get::<i64, _>(7).unwrap_or_default(),
        quantity: decimal(row, 8),
        price: decimal(row, 9),
        price_currency: row.get::<i32, _>(10).unwrap_or_default(),
        customer_code: text(row, 11).unwrap_or_default(),
        customer_name: text(row, 12),
        product_code: text(row, 13),
        payment_date: row.get::<NaiveDateTime, _>(14),
        payment_plan: text(row, 15),
        line_payment_plan: text(row, 16),
        org_unit: text(row, 17),
        warehouse: text(row, 18),
        unit: text(row, 19),
        salesperson_code: text(row, 20),
        line_type: row.get::<i32, _>(21).unwrap_or_default(),
        slip_type: row.get::<i32, _>(22).unwrap_or_default(),
        total: decimal(row, 23),
        discount_percent: decimal(row, 24),
        vat_rate: decimal(row, 25),
    })
}

/// `@P{first}, @P{first+1}, …` for `count` parameters.
fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("@P{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl SourceReader for PuntoReader {
    async fn pending_receipts(&self, limit: usize) -> Result<Vec<PuntoReceipt>> {
        let mut query = Query::new(PENDING_RECEIPTS);
        query.bind(limit as i64);
        let rows = self.query_rows(query).await?;
        debug!("PUNTO: {} pending receipts", rows.len());
        Ok(rows.iter().map(receipt_from_row).collect())
    }

    async fn mark_receipt_transferred(&self, id: i64, batch: &str) -> Result<()> {
        let mut conn = self.pool.get_client().await?;
        conn.execute(
            "UPDATE [dbo].[ERYAZ_TAHSILAT]
             SET [AKTARIM] = @P1, [AKTARIM_TARIHI] = GETDATE(), [AKTARIM_GUID] = @P2
             WHERE [ID] = @P3",
            &[&TRANSFERRED, &batch, &id],
        )
        .await?;
        Ok(())
    }

    async fn pending_orders(&self, limit: usize, min_date: NaiveDate) -> Result<Vec<PuntoOrder>> {
        let mut query = Query::new(PENDING_ORDERS);
        query.bind(limit as i64);
        query.bind(min_date);
        let rows = self.query_rows(query).await?;
        debug!("PUNTO: {} pending orders", rows.len());
        Ok(rows.iter().filter_map(order_from_row).collect())
    }

    async fn order_lines(&self, fis_no: &str) -> Result<Vec<PuntoOrderLine>> {
        let mut query = Query::new(ORDER_LINES);
        query.bind(fis_no);
        let rows = self.query_rows(query).await?;
        Ok(rows.iter().map(order_line_from_row).collect())
    }

    async fn mark_order_transferred(&self, id: i64, batch: &str) -> Result<()> {
        let mut conn = self.pool.get_client().await?;
        conn.execute(
            "UPDATE [dbo].[ERYAZ_SIPARISLER]
             SET [AKTARIM] = @P1, [AKTARIM_TARIHI] = GETDATE(), [AKTARIM_GUID] = @P2
             WHERE [ID] = @P3",
            &[&TRANSFERRED, &batch, &id],
        )
        .await?;
        Ok(())
    }

    async fn pending_pos(&self, limit: usize) -> Result<Vec<PosReceipt>> {
        let mut query = Query::new(PENDING_POS);
        query.bind(limit as i64);
        let rows = self.query_rows(query).await?;
        debug!("PUNTO: {} pending virtual POS rows", rows.len());
        Ok(rows.iter().filter_map(pos_from_row).collect())
    }

    async fn mark_pos_transferred(&self, id: i64) -> Result<()> {
        let mut conn = self.pool.get_client().await?;
        conn.execute(
            "UPDATE [dbo].[ERYAZ_SANALPOS] SET [AKTARIM] = @P1 WHERE [ID] = @P2",
            &[&TRANSFERRED, &id],
        )
        .await?;
        Ok(())
    }

    async fn pending_dispatch_lines(&self) -> Result<Vec<DispatchLine>> {
        let rows = self.query_rows(Query::new(PENDING_DISPATCH_LINES)).await?;
        debug!("PUNTO: {} unbilled dispatch lines", rows.len());
        Ok(rows.iter().filter_map(dispatch_line_from_row).collect())
    }

    async fn mark_lines_billed(&self, table: &str, refs: &[i64], invoice_ref: i64) -> Result<()> {
        if refs.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get_client().await?;
        for chunk in refs.chunks(MAX_IN_LIST) {
            let sql = format!(
                "UPDATE {} SET [INVOICEREF] = @P1, [INVOICELNNR] = 1 WHERE [LOGICALREF] IN ({})",
                table,
                placeholders(2, chunk.len())
            );
            let mut query = Query::new(sql);
            query.bind(invoice_ref);
            for r in chunk {
                query.bind(*r);
            }
            query.execute(&mut *conn).await?;
        }
        debug!("Marked {} stock lines billed in {}", refs.len(), table);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(2, 3), "@P2, @P3, @P4");
        assert_eq!(placeholders(1, 1), "@P1");
        assert_eq!(placeholders(5, 0), "");
    }

    /// Column count of a query with one select-list entry per line.
    fn selected_columns(sql: &str) -> usize {
        sql.lines()
            .skip_while(|l| !l.trim_start().starts_with("SELECT"))
            .skip(1)
            .take_while(|l| !l.trim_start().starts_with("FROM"))
            .filter(|l| !l.trim().is_empty())
            .count()
    }

    #[test]
    fn test_select_lists_match_row_readers() {
        // Last index read by each *_from_row function, plus one.
        assert_eq!(selected_columns(PENDING_RECEIPTS), 12);
        assert_eq!(selected_columns(PENDING_ORDERS), 10);
        assert_eq!(selected_columns(ORDER_LINES), 9);
        assert_eq!(selected_columns(PENDING_POS), 12);
        assert_eq!(selected_columns(PENDING_DISPATCH_LINES), 26);
    }
}

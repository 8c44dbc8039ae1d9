//! Row types read from the PUNTO database.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `TAHSILAT_TIPI` value for a cash collection.
pub const RECEIPT_CASH: i32 = 0;
/// `TAHSILAT_TIPI` value for a cheque collection.
pub const RECEIPT_CHEQUE: i32 = 1;

/// One `ERYAZ_TAHSILAT` collection row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuntoReceipt {
    /// `ID`
    pub id: i64,
    /// `NO`, the PUNTO receipt counter.
    pub no: i64,
    /// `CARI_KODU`
    pub customer_code: String,
    /// `CARI_UNVANI`
    pub customer_name: Option<String>,
    /// `TARIH`
    pub date: Option<NaiveDateTime>,
    /// `TUTAR`
    pub amount: Decimal,
    /// `NOT`
    pub note: Option<String>,
    /// `TAHSILAT_TIPI`: 0 cash, 1 cheque.
    pub receipt_type: i32,
    /// `PLASIYER_KODU`
    pub salesperson_code: Option<String>,
    /// `BANKA_ADI`
    pub bank_name: Option<String>,
    /// `CEK_SENET_NO`
    pub cheque_no: Option<String>,
    /// `VADE_TARIHI`
    pub due_date: Option<NaiveDateTime>,
}

/// One `ERYAZ_SIPARISLER` order header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuntoOrder {
    pub id: i64,
    /// `NO`
    pub no: Option<String>,
    /// `CARI_KODU`
    pub customer_code: String,
    /// `CARI_UNVANI`
    pub customer_name: Option<String>,
    /// `BELGE_NO`
    pub document_no: Option<String>,
    /// `SIPARIS_TARIHI`
    pub order_date: NaiveDateTime,
    /// `TEMSILCI_KODU`
    pub salesperson_code: Option<String>,
    /// `FIS_NO`, the key that links detail lines.
    pub fis_no: String,
    /// `DEPO`, a bare warehouse number such as "7".
    pub depot: Option<String>,
    /// `SIPARIS_NOTU`
    pub note: Option<String>,
}

/// One `ERYAZ_SIPARIS_DETAY` order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuntoOrderLine {
    pub id: i64,
    /// `URUN_KODU`
    pub product_code: String,
    /// `MIKTAR`
    pub quantity: Decimal,
    /// `BIRIM_FIYAT`
    pub unit_price: Decimal,
    /// `BIRIM`
    pub unit: Option<String>,
    /// `ISK3`
    pub discount3: Option<Decimal>,
    /// `ISK4`
    pub discount4: Option<Decimal>,
    /// `ISK_KAMPANYA`
    pub discount_campaign: Option<Decimal>,
    /// `ISK_CEP`
    pub discount_mobile: Option<Decimal>,
}

/// One row of `PNTV_ERYAZ_SANALPOS_AKTILACAKLAR` (virtual POS collections).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosReceipt {
    pub id: i64,
    /// `BELGE_NO`
    pub document_no: String,
    /// `TARIH`
    pub date: NaiveDateTime,
    /// `CARI_KODU`
    pub customer_code: String,
    /// `CARI_UNVANI`
    pub customer_name: String,
    /// `FISNO`
    pub fis_no: String,
    /// `TUTAR`
    pub amount: Decimal,
    /// `PLASIYER_KODU`
    pub salesperson_code: String,
    /// `ORGANIZASYON`
    pub org_unit: String,
    /// `BANKA_HESAP_KODU`
    pub bank_account_code: String,
    /// `BANKA_HESAP_ACIKLAMA`
    pub bank_account_name: String,
    /// `ODEME_PLANI_KODU`
    pub payment_plan_code: String,
}

/// Dispatch line type for a stock item.
pub const DISPATCH_LINE_MATERIAL: i32 = 0;
/// Dispatch line type for a line discount.
pub const DISPATCH_LINE_DISCOUNT: i32 = 2;

/// One row of `PNTV_005_IrsaliyeDetay_Faturala`: an unbilled dispatch line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchLine {
    /// `IRSALIYE_NO`
    pub dispatch_no: Option<String>,
    /// `IRSALIYE_REF`
    pub dispatch_ref: i64,
    /// `IRSALIYE_TARIHI`
    pub dispatch_date: NaiveDateTime,
    /// `IRSALIYE_SATIR_REF`, the stock line logical ref.
    pub dispatch_line_ref: i64,
    /// `SIPARIS_NO`
    pub order_no: Option<String>,
    /// `SIPARIS_TARIHI`
    pub order_date: Option<NaiveDateTime>,
    /// `SIPARIS_REF`
    pub order_ref: i64,
    /// `SIPARIS_SATIR_REF`
    pub order_line_ref: i64,
    /// `MIKTAR`
    pub quantity: Decimal,
    /// `FIYAT`
    pub price: Decimal,
    /// `FIYAT_KUR`
    pub price_currency: i32,
    /// `CARI_KOD`
    pub customer_code: String,
    /// `CARI`
    pub customer_name: Option<String>,
    /// `URUN_KODU`
    pub product_code: Option<String>,
    /// `ODEME_TARIHI`
    pub payment_date: Option<NaiveDateTime>,
    /// `ODEME_PLANI`
    pub payment_plan: Option<String>,
    /// `SATIR_ODEME_PLANI`
    pub line_payment_plan: Option<String>,
    /// `ISYERI`
    pub org_unit: Option<String>,
    /// `AMBAR`
    pub warehouse: Option<String>,
    /// `BIRIM`
    pub unit: Option<String>,
    /// `SATIS_ELEMANI`
    pub salesperson_code: Option<String>,
    /// `LINETYPE`: 0 material, 2 discount.
    pub line_type: i32,
    /// `SLIPTYPE`
    pub slip_type: i32,
    /// `TOTAL`, quantity times price.
    pub total: Decimal,
    /// `DISCPER`
    pub discount_percent: Decimal,
    /// `VATRATE`
    pub vat_rate: Decimal,
}

impl DispatchLine {
    pub fn is_material(&self) -> bool {
        self.line_type == DISPATCH_LINE_MATERIAL
    }
}

//! Records exchanged with the bill store at `/api/bills`.

use super::{InvoiceDraft, InvoiceNumber};
use crate::services::totals::{round_money, InvoiceTotals};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A stored bill as returned by `GET /api/bills`. Only the number matters here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillRecord {
    #[serde(default)]
    pub invoice_number: Option<String>,
}

/// `GET /api/bills` answers with a bare array; some deployments wrap it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BillListResponse {
    Bare(Vec<BillRecord>),
    Wrapped { bills: Vec<BillRecord> },
}

impl BillListResponse {
    pub fn into_records(self) -> Vec<BillRecord> {
        match self {
            BillListResponse::Bare(records) => records,
            BillListResponse::Wrapped { bills } => bills,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBillItem {
    pub sno: u32,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub qty: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    #[serde(rename = "gstPercentage", with = "rust_decimal::serde::float")]
    pub gst_percentage: Decimal,
    /// GST-exclusive row subtotal.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Body of `POST /api/bills`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBill {
    pub invoice_number: String,
    pub date: NaiveDate,
    pub customer_name: String,
    pub customer_mobile: String,
    pub items: Vec<NewBillItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub sub_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gst_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cgst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sgst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
}

impl NewBill {
    pub fn new(
        draft: &InvoiceDraft,
        totals: &InvoiceTotals,
        invoice_number: &InvoiceNumber,
        date: NaiveDate,
    ) -> Self {
        let items = draft
            .items
            .iter()
            .zip(totals.items.iter())
            .enumerate()
            .map(|(index, (item, item_totals))| NewBillItem {
                sno: index as u32 + 1,
                name: item.name.trim().to_string(),
                qty: item.quantity.amount(),
                rate: item.rate.amount(),
                gst_percentage: item.gst_percentage.amount(),
                total: round_money(item_totals.subtotal),
            })
            .collect();

        Self {
            invoice_number: invoice_number.to_string(),
            date,
            customer_name: draft.customer_name.trim().to_string(),
            customer_mobile: draft.customer_mobile.trim().to_string(),
            items,
            sub_total: round_money(totals.subtotal),
            gst_percentage: round_money(totals.effective_gst_percentage),
            cgst: round_money(totals.cgst),
            sgst: round_money(totals.sgst),
            grand_total: round_money(totals.grand_total),
        }
    }
}

/// Success body of `POST /api/bills`.
#[derive(Debug, Deserialize)]
pub struct SaveBillResponse {
    #[serde(default)]
    pub bill: Option<BillRecord>,
}

/// Error body of a rejected request.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn new_bill_serializes_backend_schema() {
        let mut draft = InvoiceDraft::default();
        draft.set_customer_name(" Asha Rao ");
        draft.set_customer_mobile("9876543210");
        draft.items = vec![
            LineItem::new("Deluxe Room", dec!(2), dec!(100), dec!(18)),
            LineItem::new("Tea", dec!(3), dec!(10), dec!(5)),
        ];
        let totals = InvoiceTotals::compute(&draft);
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

        let bill = NewBill::new(&draft, &totals, &InvoiceNumber::new("INV", 1043), date);
        let body = serde_json::to_value(&bill).unwrap();

        assert_eq!(
            body,
            json!({
                "invoiceNumber": "INV-1043",
                "date": "2026-10-18",
                "customerName": "Asha Rao",
                "customerMobile": "9876543210",
                "items": [
                    { "sno": 1, "name": "Deluxe Room", "qty": 2.0, "rate": 100.0, "gstPercentage": 18.0, "total": 200.0 },
                    { "sno": 2, "name": "Tea", "qty": 3.0, "rate": 10.0, "gstPercentage": 5.0, "total": 30.0 }
                ],
                "subTotal": 230.0,
                "gstPercentage": 16.3,
                "cgst": 18.75,
                "sgst": 18.75,
                "grandTotal": 267.5
            })
        );
    }

    #[test]
    fn item_rate_is_sent_as_entered() {
        let mut draft = InvoiceDraft::default();
        draft.set_customer_name("Asha Rao");
        draft.set_customer_mobile("9876543210");
        draft.items = vec![LineItem::new("Laundry", dec!(2), dec!(10.005), dec!(0))];
        let totals = InvoiceTotals::compute(&draft);
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

        let bill = NewBill::new(&draft, &totals, &InvoiceNumber::new("INV", 1043), date);

        assert_eq!(bill.items[0].rate, dec!(10.005));
        assert_eq!(bill.items[0].total, dec!(20.01));
        assert_eq!(bill.items[0].qty * bill.items[0].rate, bill.items[0].total);
    }

    #[test]
    fn bill_list_accepts_bare_and_wrapped_shapes() {
        let bare: BillListResponse =
            serde_json::from_value(json!([{ "invoiceNumber": "INV-1001" }, {}])).unwrap();
        assert_eq!(bare.into_records().len(), 2);

        let wrapped: BillListResponse =
            serde_json::from_value(json!({ "bills": [{ "invoiceNumber": "INV-1002" }] }))
                .unwrap();
        let records = wrapped.into_records();
        assert_eq!(records[0].invoice_number.as_deref(), Some("INV-1002"));
    }
}

//! Display-ready invoice document shared by the HTML preview and the PNG export.

use super::InvoiceDraft;
use crate::config::BusinessSettings;
use crate::services::totals::{format_money, InvoiceTotals};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub sno: usize,
    pub name: String,
    pub quantity: String,
    pub rate: String,
    pub gst_percentage: String,
    /// Row total including GST.
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewTotalLine {
    pub label: String,
    pub amount: String,
    pub emphasize: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePreview {
    pub brand: String,
    pub tax_id: String,
    pub address: Vec<String>,
    pub phone: Option<String>,
    pub invoice_number: String,
    pub date: String,
    pub customer_name: String,
    pub customer_mobile: String,
    pub rows: Vec<PreviewRow>,
    pub totals: Vec<PreviewTotalLine>,
}

impl InvoicePreview {
    /// Build the printable document. Totals are recomputed from `draft` here, so
    /// the preview can never show stale figures.
    pub fn render(
        business: &BusinessSettings,
        draft: &InvoiceDraft,
        invoice_number: &str,
        date: NaiveDate,
    ) -> Self {
        let totals = InvoiceTotals::compute(draft);

        let rows = draft
            .items
            .iter()
            .zip(totals.items.iter())
            .enumerate()
            .map(|(index, (item, item_totals))| PreviewRow {
                sno: index + 1,
                name: item.name.trim().to_string(),
                quantity: item.quantity.amount().normalize().to_string(),
                rate: format_money(item.rate.amount()),
                gst_percentage: format!("{}%", item.gst_percentage.amount().normalize()),
                amount: format_money(item_totals.total_with_gst),
            })
            .collect();

        let mut lines = vec![
            PreviewTotalLine {
                label: "Subtotal".to_string(),
                amount: format_money(totals.subtotal),
                emphasize: false,
            },
            PreviewTotalLine {
                label: "CGST".to_string(),
                amount: format_money(totals.cgst),
                emphasize: false,
            },
            PreviewTotalLine {
                label: "SGST".to_string(),
                amount: format_money(totals.sgst),
                emphasize: false,
            },
            PreviewTotalLine {
                label: "Total GST".to_string(),
                amount: format_money(totals.gst_amount),
                emphasize: false,
            },
        ];

        if totals.has_discount() {
            lines.push(PreviewTotalLine {
                label: format!(
                    "Discount ({}%)",
                    draft.discount_percentage.amount().normalize()
                ),
                amount: format!("-{}", format_money(totals.discount_amount)),
                emphasize: false,
            });
        }

        lines.push(PreviewTotalLine {
            label: "Grand Total".to_string(),
            amount: format_money(totals.grand_total),
            emphasize: true,
        });

        Self {
            brand: business.brand.clone(),
            tax_id: business.tax_id.clone(),
            address: business.address.clone(),
            phone: business.phone.clone(),
            invoice_number: invoice_number.to_string(),
            date: date.format("%d/%m/%Y").to_string(),
            customer_name: draft.customer_name.trim().to_string(),
            customer_mobile: draft.customer_mobile.trim().to_string(),
            rows,
            totals: lines,
        }
    }

    /// `<Brand>-Invoice-<InvoiceNumber>.png`
    pub fn file_name(&self) -> String {
        format!("{}-Invoice-{}.png", self.brand, self.invoice_number)
    }
}

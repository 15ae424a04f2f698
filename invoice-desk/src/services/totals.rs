//! Derived totals for an invoice draft.
//!
//! Everything here is a pure function of the draft. Values keep full `Decimal`
//! precision; callers round with [`round_money`] only when displaying or
//! serializing.

use crate::models::{InvoiceDraft, LineItem, NumericInput};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

fn percent(value: NumericInput) -> Decimal {
    value.amount() / Decimal::ONE_HUNDRED
}

/// `quantity * rate`; empty fields count as zero.
pub fn item_subtotal(quantity: NumericInput, rate: NumericInput) -> Decimal {
    quantity.amount() * rate.amount()
}

/// GST charged on one row.
pub fn item_gst_amount(quantity: NumericInput, rate: NumericInput, gst: NumericInput) -> Decimal {
    item_subtotal(quantity, rate) * percent(gst)
}

/// `subtotal * (1 + gst / 100)`.
pub fn item_total_with_gst(
    quantity: NumericInput,
    rate: NumericInput,
    gst: NumericInput,
) -> Decimal {
    item_subtotal(quantity, rate) * (Decimal::ONE + percent(gst))
}

/// Round a money or percentage value to 2 decimal places, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounded to 2 places and always printed with two decimals.
pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", round_money(value))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemTotals {
    pub subtotal: Decimal,
    pub gst_amount: Decimal,
    pub total_with_gst: Decimal,
}

impl ItemTotals {
    pub fn for_item(item: &LineItem) -> Self {
        Self {
            subtotal: item_subtotal(item.quantity, item.rate),
            gst_amount: item_gst_amount(item.quantity, item.rate, item.gst_percentage),
            total_with_gst: item_total_with_gst(item.quantity, item.rate, item.gst_percentage),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceTotals {
    /// Per-row totals, same order as the draft's items.
    pub items: Vec<ItemTotals>,
    pub subtotal: Decimal,
    pub gst_amount: Decimal,
    pub subtotal_incl_gst: Decimal,
    pub discount_amount: Decimal,
    pub grand_total: Decimal,
    /// GST as a share of the subtotal; zero when the subtotal is zero.
    pub effective_gst_percentage: Decimal,
    /// Half of the GST amount. CGST and SGST are always an even split.
    pub cgst: Decimal,
    pub sgst: Decimal,
}

impl InvoiceTotals {
    pub fn compute(draft: &InvoiceDraft) -> Self {
        Self::from_items(&draft.items, draft.discount_percentage)
    }

    pub fn from_items(items: &[LineItem], discount_percentage: NumericInput) -> Self {
        let items: Vec<ItemTotals> = items.iter().map(ItemTotals::for_item).collect();

        let subtotal: Decimal = items.iter().map(|t| t.subtotal).sum();
        let gst_amount: Decimal = items.iter().map(|t| t.gst_amount).sum();
        let subtotal_incl_gst = subtotal + gst_amount;
        let discount_amount = subtotal_incl_gst * percent(discount_percentage);
        let grand_total = subtotal_incl_gst - discount_amount;

        let effective_gst_percentage = if subtotal > Decimal::ZERO {
            gst_amount / subtotal * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        let half_gst = gst_amount / Decimal::TWO;

        Self {
            items,
            subtotal,
            gst_amount,
            subtotal_incl_gst,
            discount_amount,
            grand_total,
            effective_gst_percentage,
            cgst: half_gst,
            sgst: half_gst,
        }
    }

    pub fn has_discount(&self) -> bool {
        !self.discount_amount.is_zero()
    }
}

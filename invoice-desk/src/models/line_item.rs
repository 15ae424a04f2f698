//! Line item model for the invoice draft.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound for quantities and rates.
pub const MAX_NUMERIC_INPUT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Upper bound for GST and discount percentages.
pub const MAX_PERCENTAGE: Decimal = Decimal::ONE_HUNDRED;

/// A numeric form field.
///
/// `Empty` is the "cleared" state: the input renders blank instead of `0` while
/// the user is typing. It counts as zero in every computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NumericInput {
    #[default]
    Empty,
    Value(Decimal),
}

impl NumericInput {
    pub fn value(amount: Decimal) -> Self {
        NumericInput::Value(amount)
    }

    /// The amount used for arithmetic; `Empty` is zero.
    pub fn amount(&self) -> Decimal {
        match self {
            NumericInput::Empty => Decimal::ZERO,
            NumericInput::Value(v) => *v,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NumericInput::Empty)
    }

    /// Missing for submission purposes: empty or zero.
    pub fn is_missing(&self) -> bool {
        self.amount().is_zero()
    }

    /// Blur-commit: an empty field becomes an explicit zero.
    pub fn committed(self) -> Self {
        match self {
            NumericInput::Empty => NumericInput::Value(Decimal::ZERO),
            value => value,
        }
    }
}

impl fmt::Display for NumericInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericInput::Empty => Ok(()),
            NumericInput::Value(v) => write!(f, "{}", v.normalize()),
        }
    }
}

/// Parse raw form text into a quantity or rate.
///
/// - blank text is `Empty`
/// - plain decimals (`"12.5"`) and scientific notation (`"1e3"`) are accepted
/// - text that is not a number is `Empty`, so it computes as zero
/// - negative values clamp to zero, values above [`MAX_NUMERIC_INPUT`] clamp down
pub fn parse_numeric(raw: &str) -> NumericInput {
    parse_bounded(raw, MAX_NUMERIC_INPUT)
}

/// Same rules as [`parse_numeric`], clamped to [`MAX_PERCENTAGE`].
pub fn parse_percentage(raw: &str) -> NumericInput {
    parse_bounded(raw, MAX_PERCENTAGE)
}

fn parse_bounded(raw: &str, max: Decimal) -> NumericInput {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NumericInput::Empty;
    }

    let parsed = Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed));

    match parsed {
        Ok(value) if value.is_sign_negative() => NumericInput::Value(Decimal::ZERO),
        Ok(value) => NumericInput::Value(value.min(max)),
        Err(_) => NumericInput::Empty,
    }
}

/// Editable column of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
    Name,
    Quantity,
    Rate,
    GstPercentage,
}

impl ItemField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemField::Name => "name",
            ItemField::Quantity => "quantity",
            ItemField::Rate => "rate",
            ItemField::GstPercentage => "gst_percentage",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ItemField::Name)
    }
}

/// One billable row. List position is print order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: NumericInput,
    pub rate: NumericInput,
    pub gst_percentage: NumericInput,
}

impl LineItem {
    /// A fresh row: empty name, quantity and rate, zero GST.
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            quantity: NumericInput::Empty,
            rate: NumericInput::Empty,
            gst_percentage: NumericInput::Value(Decimal::ZERO),
        }
    }

    pub fn new(name: impl Into<String>, quantity: Decimal, rate: Decimal, gst: Decimal) -> Self {
        Self {
            name: name.into(),
            quantity: NumericInput::Value(quantity),
            rate: NumericInput::Value(rate),
            gst_percentage: NumericInput::Value(gst),
        }
    }

    /// Apply raw form text to one field.
    pub fn update(&mut self, field: ItemField, raw: &str) {
        match field {
            ItemField::Name => self.name = raw.to_string(),
            ItemField::Quantity => self.quantity = parse_numeric(raw),
            ItemField::Rate => self.rate = parse_numeric(raw),
            ItemField::GstPercentage => self.gst_percentage = parse_percentage(raw),
        }
    }

    /// Coerce an empty numeric field to zero. Returns whether anything changed.
    pub fn commit(&mut self, field: ItemField) -> bool {
        let slot = match field {
            ItemField::Name => return false,
            ItemField::Quantity => &mut self.quantity,
            ItemField::Rate => &mut self.rate,
            ItemField::GstPercentage => &mut self.gst_percentage,
        };

        let was_empty = slot.is_empty();
        *slot = slot.committed();
        was_empty
    }
}

impl Default for LineItem {
    fn default() -> Self {
        Self::blank()
    }
}

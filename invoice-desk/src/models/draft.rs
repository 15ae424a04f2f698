//! The in-progress invoice held for one browser session.

use super::line_item::{parse_percentage, ItemField, LineItem, NumericInput};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most rows a single invoice may carry.
///
/// With quantities and rates capped at 1e9 and percentages at 100, totals over
/// this many rows stay far inside `Decimal`'s range.
pub const MAX_ITEMS: usize = 100;

/// A single reason the draft cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("Customer name is required")]
    MissingCustomerName,

    #[error("Customer mobile number is required")]
    MissingCustomerMobile,

    #[error("Add at least one item")]
    NoItems,

    #[error("An invoice can hold at most {} items", MAX_ITEMS)]
    TooManyItems,

    #[error("Item {} is missing its {}", .index + 1, .field.as_str().replace('_', " "))]
    IncompleteItem { index: usize, field: ItemField },
}

/// Submission blocked; nothing was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub customer_name: String,
    pub customer_mobile: String,
    pub items: Vec<LineItem>,
    pub discount_percentage: NumericInput,
}

impl Default for InvoiceDraft {
    /// Blank customer, one blank item, no discount.
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            customer_mobile: String::new(),
            items: vec![LineItem::blank()],
            discount_percentage: NumericInput::value(rust_decimal::Decimal::ZERO),
        }
    }
}

impl InvoiceDraft {
    pub fn set_customer_name(&mut self, name: &str) {
        self.customer_name = name.to_string();
    }

    pub fn set_customer_mobile(&mut self, mobile: &str) {
        self.customer_mobile = mobile.to_string();
    }

    /// Append a blank row. Ignored once the draft holds [`MAX_ITEMS`] rows.
    pub fn add_item(&mut self) -> bool {
        if self.items.len() >= MAX_ITEMS {
            return false;
        }
        self.items.push(LineItem::blank());
        true
    }

    /// Remove the row at `index`. Out-of-range indexes are ignored; the last
    /// row may be removed.
    pub fn remove_item(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.items.remove(index);
            true
        } else {
            false
        }
    }

    /// Apply raw form text to one cell. Out-of-range indexes are ignored.
    pub fn update_item(&mut self, index: usize, field: ItemField, raw: &str) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.update(field, raw);
                true
            }
            None => false,
        }
    }

    /// Blur-commit for one numeric cell. Returns whether the stored value changed.
    pub fn commit_item_field(&mut self, index: usize, field: ItemField) -> bool {
        self.items
            .get_mut(index)
            .map(|item| item.commit(field))
            .unwrap_or(false)
    }

    pub fn set_discount_percentage(&mut self, raw: &str) {
        self.discount_percentage = parse_percentage(raw);
    }

    /// Blur-commit for the discount field. Returns whether the stored value changed.
    pub fn commit_discount(&mut self) -> bool {
        let was_empty = self.discount_percentage.is_empty();
        self.discount_percentage = self.discount_percentage.committed();
        was_empty
    }

    /// Back to the blank form shown after a successful save.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Check every field required for submission, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.customer_name.trim().is_empty() {
            issues.push(ValidationIssue::MissingCustomerName);
        }
        if self.customer_mobile.trim().is_empty() {
            issues.push(ValidationIssue::MissingCustomerMobile);
        }
        if self.items.is_empty() {
            issues.push(ValidationIssue::NoItems);
        }
        if self.items.len() > MAX_ITEMS {
            issues.push(ValidationIssue::TooManyItems);
        }

        for (index, item) in self.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                issues.push(ValidationIssue::IncompleteItem {
                    index,
                    field: ItemField::Name,
                });
            }
            if item.quantity.is_missing() {
                issues.push(ValidationIssue::IncompleteItem {
                    index,
                    field: ItemField::Quantity,
                });
            }
            if item.rate.is_missing() {
                issues.push(ValidationIssue::IncompleteItem {
                    index,
                    field: ItemField::Rate,
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

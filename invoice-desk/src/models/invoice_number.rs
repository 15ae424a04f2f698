//! Sequential invoice numbers of the form `PREFIX-NNNN`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceNumber {
    pub prefix: String,
    pub sequence: u32,
}

impl InvoiceNumber {
    pub fn new(prefix: impl Into<String>, sequence: u32) -> Self {
        Self {
            prefix: prefix.into(),
            sequence,
        }
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:04}", self.prefix, self.sequence)
    }
}

/// Numeric suffix of `number` when it is `<prefix>-<digits>`.
pub fn parse_suffix(prefix: &str, number: &str) -> Option<u32> {
    let digits = number.trim().strip_prefix(prefix)?.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Next sequence to issue given the numbers already stored remotely:
/// one past the highest matching suffix, or `floor + 1` when nothing matches.
pub fn seed_from<'a>(prefix: &str, floor: u32, existing: impl IntoIterator<Item = &'a str>) -> u32 {
    existing
        .into_iter()
        .filter_map(|number| parse_suffix(prefix, number))
        .fold(floor, u32::max)
        .saturating_add(1)
}

/// The desk's local counter. It holds the number the next saved bill will use
/// and is advanced only after the bill store accepts a save.
///
/// Nothing here makes numbers unique across desks; two desks seeded from the
/// same remote state will issue the same number.
#[derive(Debug, Clone)]
pub struct InvoiceCounter {
    prefix: String,
    next: u32,
}

impl InvoiceCounter {
    pub fn new(prefix: impl Into<String>, next: u32) -> Self {
        Self {
            prefix: prefix.into(),
            next,
        }
    }

    pub fn current(&self) -> InvoiceNumber {
        InvoiceNumber::new(self.prefix.clone(), self.next)
    }

    pub fn advance(&mut self) {
        self.next = self.next.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_four_digit_padding() {
        assert_eq!(InvoiceNumber::new("INV", 1043).to_string(), "INV-1043");
        assert_eq!(InvoiceNumber::new("INV", 7).to_string(), "INV-0007");
        assert_eq!(InvoiceNumber::new("INV", 12345).to_string(), "INV-12345");
    }

    #[test]
    fn parses_only_matching_prefix() {
        assert_eq!(parse_suffix("INV", "INV-1042"), Some(1042));
        assert_eq!(parse_suffix("INV", "INV-0042"), Some(42));
        assert_eq!(parse_suffix("INV", "BILL-1042"), None);
        assert_eq!(parse_suffix("INV", "INV1042"), None);
        assert_eq!(parse_suffix("INV", "INV-"), None);
        assert_eq!(parse_suffix("INV", "INV-12a"), None);
        assert_eq!(parse_suffix("INV", "INV--5"), None);
    }

    #[test]
    fn seeds_one_past_highest_suffix() {
        let existing = ["INV-1001", "INV-1042", "INV-1017", "OTHER-9999"];
        assert_eq!(seed_from("INV", 1000, existing), 1043);
    }

    #[test]
    fn seeds_from_floor_when_nothing_matches() {
        assert_eq!(seed_from("INV", 1000, ["legacy-7", ""]), 1001);
        assert_eq!(seed_from("INV", 1000, std::iter::empty()), 1001);
    }

    #[test]
    fn numbers_below_floor_do_not_lower_the_seed() {
        assert_eq!(seed_from("INV", 1000, ["INV-0005"]), 1001);
    }

    #[test]
    fn counter_advances_by_one() {
        let mut counter = InvoiceCounter::new("INV", 1043);
        assert_eq!(counter.current().to_string(), "INV-1043");
        counter.advance();
        assert_eq!(counter.current().to_string(), "INV-1044");
    }
}

//! Document number series.
//!
//! Numbers follow `PREFIX-YYYYMM-NNN`, restarting at 001 each calendar
//! month. The next sequence value is derived by counting existing numbers
//! that carry the month tag, so deleting the latest document reuses its
//! number while holes earlier in the series stay open.

use chrono::{Datelike, NaiveDate};

pub const INVOICE_PREFIX: &str = "AMP-INV";
pub const VENDOR_INVOICE_PREFIX: &str = "AMP-VI";
pub const PURCHASE_ORDER_PREFIX: &str = "AMP-PO";

/// `YYYYMM` tag for the month a document is numbered in.
pub fn month_tag(date: NaiveDate) -> String {
    format!("{:04}{:02}", date.year(), date.month())
}

/// Next number in the series for `date`'s month, given the numbers already
/// issued in that series.
pub fn next_in_series<'a>(
    prefix: &str,
    date: NaiveDate,
    existing: impl IntoIterator<Item = &'a str>,
) -> String {
    let tag = month_tag(date);
    let seq = existing
        .into_iter()
        .filter(|number| number.contains(&tag))
        .count()
        + 1;
    format!("{prefix}-{tag}-{seq:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn first_number_of_a_month_is_001() {
        let number = next_in_series(INVOICE_PREFIX, march(1), []);
        assert_eq!(number, "AMP-INV-202403-001");
    }

    #[test]
    fn sequence_counts_numbers_in_the_same_month() {
        let existing = ["AMP-INV-202403-001", "AMP-INV-202403-002"];
        let number = next_in_series(INVOICE_PREFIX, march(20), existing);
        assert_eq!(number, "AMP-INV-202403-003");
    }

    #[test]
    fn other_months_do_not_advance_the_sequence() {
        let existing = ["AMP-INV-202402-001", "AMP-INV-202402-002"];
        let number = next_in_series(INVOICE_PREFIX, march(1), existing);
        assert_eq!(number, "AMP-INV-202403-001");
    }

    #[test]
    fn each_series_has_its_own_prefix() {
        assert_eq!(
            next_in_series(VENDOR_INVOICE_PREFIX, march(1), []),
            "AMP-VI-202403-001"
        );
        assert_eq!(
            next_in_series(PURCHASE_ORDER_PREFIX, march(1), []),
            "AMP-PO-202403-001"
        );
    }

    #[test]
    fn month_tag_zero_pads_the_month() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 9).unwrap();
        assert_eq!(month_tag(date), "202507");
    }
}

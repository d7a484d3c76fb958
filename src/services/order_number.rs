//! Human-readable order numbers: `PREFIX-YYYY-MM-DD-NNNN`.

use chrono::NaiveDate;

/// Date-scoped prefix shared by every order placed on `date`, including the trailing dash.
pub fn day_prefix(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}-", prefix, date.format("%Y-%m-%d"))
}

/// Formats the `sequence`-th order of the day; sequences start at 1.
pub fn format_order_number(prefix: &str, date: NaiveDate, sequence: u64) -> String {
    format!("{}{:04}", day_prefix(prefix, date), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pads_sequence_to_four_digits() {
        assert_eq!(
            format_order_number("SJ", date(2024, 3, 7), 1),
            "SJ-2024-03-07-0001"
        );
        assert_eq!(
            format_order_number("SJ", date(2024, 12, 31), 42),
            "SJ-2024-12-31-0042"
        );
    }

    #[test]
    fn sequence_beyond_four_digits_is_not_truncated() {
        assert_eq!(
            format_order_number("SJ", date(2024, 1, 1), 12345),
            "SJ-2024-01-01-12345"
        );
    }

    #[test]
    fn day_prefix_matches_formatted_numbers() {
        let d = date(2025, 6, 1);
        assert!(format_order_number("SHOP", d, 9).starts_with(&day_prefix("SHOP", d)));
    }
}

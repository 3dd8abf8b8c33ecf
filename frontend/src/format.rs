//! Rupiah and date rendering plus amount input parsing.

use chrono::{Datelike, NaiveDate};

use crate::error::ValidationError;
use crate::model::Amount;

/// One-tap amounts offered in the deposit/withdraw dialog.
pub const QUICK_AMOUNTS: [i64; 4] = [50_000, 100_000, 250_000, 500_000];

const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// `1500000` → `1.500.000`.
pub fn format_with_separators(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    if value < 0 {
        format!("-{out}")
    } else {
        out
    }
}

pub fn format_currency(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}Rp {}", format_with_separators(amount.abs()))
}

/// `15 Januari 2024`.
pub fn format_date(date: NaiveDate) -> String {
    let month = MONTHS
        .get(date.month0() as usize)
        .copied()
        .unwrap_or_default();
    format!("{} {} {}", date.day(), month, date.year())
}

fn digits_of(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Parse a typed amount, ignoring separators and any other non-digit.
pub fn parse_amount_input(input: &str) -> Result<Amount, ValidationError> {
    let digits = digits_of(input);
    if digits.is_empty() {
        return Err(ValidationError::NonNumericAmount);
    }
    let value = digits
        .parse::<i64>()
        .map_err(|_| ValidationError::NonNumericAmount)?;
    Amount::new(value)
}

/// Parse a month count typed into the settings form.
pub fn parse_months_input(input: &str) -> Result<u32, ValidationError> {
    let digits = digits_of(input);
    match digits.parse::<u32>() {
        Ok(0) | Err(_) => Err(ValidationError::NonPositiveMonths),
        Ok(months) => Ok(months),
    }
}

/// Re-render what the user typed with thousands separators.
pub fn format_amount_input(input: &str) -> String {
    let digits = digits_of(input);
    match digits.parse::<i64>() {
        Ok(value) => format_with_separators(value),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "Rp 0")]
    #[case(999, "Rp 999")]
    #[case(1_000, "Rp 1.000")]
    #[case(10_000_000, "Rp 10.000.000")]
    #[case(-250_000, "-Rp 250.000")]
    fn currency_uses_dot_separators(#[case] amount: i64, #[case] expected: &str) {
        assert_eq!(format_currency(amount), expected);
    }

    #[test]
    fn dates_use_indonesian_month_names() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 17).expect("valid date");
        assert_eq!(format_date(date), "17 Agustus 2024");
    }

    #[rstest]
    #[case("Rp 1.500.000", 1_500_000)]
    #[case("50000", 50_000)]
    #[case(" 7 ", 7)]
    fn amount_input_ignores_separators(#[case] input: &str, #[case] expected: i64) {
        assert_eq!(parse_amount_input(input).map(Amount::get), Ok(expected));
    }

    #[rstest]
    #[case("", ValidationError::NonNumericAmount)]
    #[case("abc", ValidationError::NonNumericAmount)]
    #[case("99999999999999999999999", ValidationError::NonNumericAmount)]
    #[case("0", ValidationError::NonPositiveAmount { value: 0 })]
    fn amount_input_rejects_bad_values(#[case] input: &str, #[case] expected: ValidationError) {
        assert_eq!(parse_amount_input(input), Err(expected));
    }

    #[rstest]
    #[case("6", Ok(6))]
    #[case("0", Err(ValidationError::NonPositiveMonths))]
    #[case("", Err(ValidationError::NonPositiveMonths))]
    fn months_input_must_be_positive(
        #[case] input: &str,
        #[case] expected: Result<u32, ValidationError>,
    ) {
        assert_eq!(parse_months_input(input), expected);
    }

    #[test]
    fn amount_input_is_reformatted_while_typing() {
        assert_eq!(format_amount_input("1234567"), "1.234.567");
        assert_eq!(format_amount_input("Rp"), "");
    }
}

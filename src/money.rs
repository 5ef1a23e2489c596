// src/money.rs

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse a Brazilian-formatted money string (`R$ 1.234,56`, `130,16`, `89.5`).
///
/// Anything unparseable becomes zero: catalog rows are typed by hand and a
/// stray character must not block the whole catalog.
pub fn parse_money(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    let normalized = match (cleaned.contains(','), cleaned.contains('.')) {
        (true, true) => cleaned.replace('.', "").replace(',', "."),
        (true, false) => cleaned.replace(',', "."),
        _ => cleaned,
    };

    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

/// Round half-up (away from zero) to cents.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render an amount as `R$ 1.234,56`.
pub fn format_brl(value: Decimal) -> String {
    let rounded = round_cents(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("R$ {sign}{grouped},{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("R$ 1.234,56"), dec!(1234.56));
        assert_eq!(parse_money("130,16"), dec!(130.16));
        assert_eq!(parse_money("R$ 88,38"), dec!(88.38));
        assert_eq!(parse_money("1234.56"), dec!(1234.56));
        assert_eq!(parse_money(" 293.47 "), dec!(293.47));
        assert_eq!(parse_money("garbage"), Decimal::ZERO);
        assert_eq!(parse_money(""), Decimal::ZERO);
        assert_eq!(parse_money("1,2,3"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_money_idempotent_on_normalized() {
        for raw in ["0.5", "130.16", "2934.70"] {
            let once = parse_money(raw);
            assert_eq!(parse_money(&once.to_string()), once);
        }
    }

    #[test]
    fn test_format_brl() {
        assert_eq!(format_brl(dec!(1234.5)), "R$ 1.234,50");
        assert_eq!(format_brl(dec!(130.16)), "R$ 130,16");
        assert_eq!(format_brl(dec!(0)), "R$ 0,00");
        assert_eq!(format_brl(dec!(1234567.891)), "R$ 1.234.567,89");
        assert_eq!(format_brl(dec!(-1500)), "R$ -1.500,00");
    }

    #[test]
    fn test_round_cents_half_up() {
        assert_eq!(round_cents(dec!(78.096)), dec!(78.10));
        assert_eq!(round_cents(dec!(0.125)), dec!(0.13));
        assert_eq!(round_cents(dec!(312.384)), dec!(312.38));
    }
}

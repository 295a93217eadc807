// src/common/format.rs

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::common::error::AppError;

// Acima disso é quase certamente erro de digitação
const MAX_AMOUNT: i64 = 100_000_000;

pub const CURRENCY_SYMBOL: &str = "₡";

/// Converte o texto do formulário em um valor monetário positivo com até 2 casas.
/// Aceita separador de milhar com vírgula ("1,250.00").
pub fn parse_amount(raw: &str) -> Result<Decimal, AppError> {
    let compact: String = raw
        .trim()
        .trim_start_matches(CURRENCY_SYMBOL)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let cleaned = strip_thousands(&compact).ok_or(AppError::InvalidAmount)?;
    if cleaned.is_empty() {
        return Err(AppError::InvalidAmount);
    }

    let amount = Decimal::from_str(&cleaned).map_err(|_| AppError::InvalidAmount)?;
    check_amount(amount)
}

// Vírgula só vale como milhar: grupos de 3 dígitos antes do ponto ("12,50" não é 1250)
fn strip_thousands(value: &str) -> Option<String> {
    let (integer, fraction) = match value.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (value, None),
    };
    if fraction.is_some_and(|f| f.contains(',')) {
        return None;
    }

    let mut groups = integer.split(',');
    let first = groups.next().unwrap_or_default();
    let mut digits = first.to_string();
    for group in groups {
        let valid = !first.is_empty()
            && first.len() <= 3
            && group.len() == 3
            && group.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return None;
        }
        digits.push_str(group);
    }

    Some(match fraction {
        Some(fraction) => format!("{digits}.{fraction}"),
        None => digits,
    })
}

pub fn check_amount(amount: Decimal) -> Result<Decimal, AppError> {
    if amount <= Decimal::ZERO || (amount.scale() > 2 && amount.normalize().scale() > 2) {
        return Err(AppError::InvalidAmount);
    }
    if amount > Decimal::from(MAX_AMOUNT) {
        return Err(AppError::InvalidAmount);
    }
    Ok(amount.round_dp(2))
}

/// Datas chegam como `YYYY-MM-DD` (input type=date) ou `DD/MM/YYYY` (digitadas).
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| AppError::InvalidDate)
}

/// Variante para filtros opcionais: vazio vira None.
pub fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some),
    }
}

/// `1234.5` -> `₡1,234.50`, `-40` -> `-₡40.00`
pub fn format_money(amount: Decimal) -> String {
    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}{}{}", sign, CURRENCY_SYMBOL, group_thousands(amount.abs()))
}

/// Valor simples com duas casas, para CSV e JSON.
pub fn format_plain(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn group_thousands(amount: Decimal) -> String {
    let text = format!("{:.2}", amount.round_dp(2));
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}.{}", grouped, frac_part)
}

/// Texto do formulário sem espaços nas pontas; vazio vira None.
pub fn clean_opt(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_amount_shapes() {
        assert_eq!(parse_amount("100").unwrap(), Decimal::new(100, 0));
        assert_eq!(parse_amount("100.5").unwrap(), Decimal::new(1005, 1));
        assert_eq!(parse_amount("1,250.00").unwrap(), Decimal::new(125000, 2));
        assert_eq!(parse_amount(" ₡2500 ").unwrap(), Decimal::new(2500, 0));
        assert_eq!(parse_amount("3.10").unwrap(), Decimal::new(310, 2));
        assert_eq!(parse_amount("1,234,567").unwrap(), Decimal::new(1234567, 0));
    }

    #[test]
    fn rejects_bad_amounts() {
        for raw in ["abc", "-5", "0", "0.00", "1.234", "", "   ", "12,5,0.1.1", "12,50", "1,2", "1,2345", "2,5", "1,250,00", "10.5,0", ",250"] {
            assert!(
                matches!(parse_amount(raw), Err(AppError::InvalidAmount)),
                "deveria rejeitar {raw:?}"
            );
        }
        assert!(parse_amount("100000001").is_err());
    }

    #[test]
    fn trailing_zeros_beyond_cents_are_accepted() {
        assert_eq!(parse_amount("12.500").unwrap(), Decimal::new(1250, 2));
    }

    #[test]
    fn parses_both_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_date("2024-01-05").unwrap(), expected);
        assert_eq!(parse_date("05/01/2024").unwrap(), expected);
        assert!(matches!(parse_date("2024-13-01"), Err(AppError::InvalidDate)));
        assert!(matches!(parse_date("ayer"), Err(AppError::InvalidDate)));
    }

    #[test]
    fn optional_date_treats_blank_as_none() {
        assert_eq!(parse_optional_date(None).unwrap(), None);
        assert_eq!(parse_optional_date(Some("  ")).unwrap(), None);
        assert!(parse_optional_date(Some("x")).is_err());
    }

    #[test]
    fn formats_money_with_grouping_and_sign() {
        assert_eq!(format_money(Decimal::new(12345, 1)), "₡1,234.50");
        assert_eq!(format_money(Decimal::new(-40, 0)), "-₡40.00");
        assert_eq!(format_money(Decimal::ZERO), "₡0.00");
        assert_eq!(format_money(Decimal::new(100000000, 2)), "₡1,000,000.00");
        assert_eq!(format_money(Decimal::new(999, 0)), "₡999.00");
    }

    #[test]
    fn plain_format_keeps_two_decimals() {
        assert_eq!(format_plain(Decimal::new(85, 0)), "85.00");
        assert_eq!(format_plain(Decimal::new(-405, 1)), "-40.50");
    }
}

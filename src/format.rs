//! Currency presentation for estimates.
//!
//! Values are shown in the Brazilian convention: "." groups thousands and ","
//! separates decimals. The number is first rendered the usual way
//! (`12,345.60`) and the two separators are then swapped through a
//! placeholder.

pub const CURRENCY_CODE: &str = "BRL";
pub const CURRENCY_SYMBOL: &str = "R$";

const PLACEHOLDER: char = 'X';

/// `12345.6` -> `"12.345,60"`
pub fn format_currency(value: f64) -> String {
    swap_separators(&group_thousands(value))
}

/// `12345.6` -> `"R$ 12.345,60"`
pub fn format_brl(value: f64) -> String {
    format!("{} {}", CURRENCY_SYMBOL, format_currency(value))
}

/// Two decimals, "," thousands, "." decimal.
pub fn group_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3 + 4);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, fraction)
}

fn swap_separators(text: &str) -> String {
    text.replace(',', &PLACEHOLDER.to_string())
        .replace('.', ",")
        .replace(PLACEHOLDER, ".")
}

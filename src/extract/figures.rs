//! Financial figure extraction
//!
//! Grammar for one figure, in order:
//!
//! ```text
//! [ "(" ] [ sign ] [ currency ] [ sign ] digits [ "." digits ] [ scale ] [ "%" ] [ ")" ]
//! ```
//!
//! * sign: `-`, `+` or `−`. A hyphen that follows a word or a number is a
//!   range separator (`Rs 0- Rs 4 lakh`, `2025-26`), not a sign. A sign
//!   after the currency marker (`Rs -1,200`, `$-300`) always is one.
//! * currency: `$ ₹ € £ Rs Rs. INR USD`
//! * digits: plain, or comma grouped in western (`1,500,000`) or Indian
//!   (`15,00,000`) style
//! * scale: `lakh`, `crore`, `million`, `billion` (plural accepted)
//! * a matched pair of parentheses marks a negative amount
//!
//! Numbers glued to letters (`80C`, `FY25`, `5th`) are not figures.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static FIGURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        (?P<open>\()?
        (?:(?P<sign>[-+\x{2212}])\s*)?
        (?:(?P<currency>Rs\.?|INR|USD|[$\x{20B9}\x{20AC}\x{00A3}])\s*)?
        (?:(?P<inner_sign>[-+\x{2212}])\s*)?
        (?P<number>\d{1,3}(?:,\d{2,3})+(?:\.\d+)?|\d+(?:\.\d+)?)
        (?:\s*(?P<scale>(?i:lakhs?|crores?|millions?|billions?))\b)?
        (?:\s*(?P<percent>%))?
        (?P<close>\))?
        ",
    )
    .expect("figure grammar is a valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FigureKind {
    /// Carries a currency marker or a scale word
    Amount,
    Percent,
    /// A bare number
    Plain,
}

/// One figure found in text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// Numeric value with scale and sign applied
    pub value: f64,
    /// ISO code of the currency marker, if any
    pub currency: Option<String>,
    pub kind: FigureKind,
    /// The matched text
    pub raw: String,
}

/// All figures in `text`, left to right
pub fn extract_figures(text: &str) -> Vec<Figure> {
    FIGURE
        .captures_iter(text)
        .filter_map(|caps| figure_from(text, &caps))
        .collect()
}

/// Amounts only (currency or scale present)
pub fn extract_amounts(text: &str) -> Vec<Figure> {
    extract_figures(text)
        .into_iter()
        .filter(|f| f.kind == FigureKind::Amount)
        .collect()
}

/// Clean a single currency string such as `"$1,234.56"`, `"(2,000)"` or
/// `"Rs 4 lakh"`.
///
/// Returns `None` unless the string holds exactly one figure.
pub fn parse_amount(text: &str) -> Option<f64> {
    let figures = extract_figures(text.trim());
    match figures.as_slice() {
        [only] => Some(only.value),
        _ => None,
    }
}

fn figure_from(text: &str, caps: &Captures<'_>) -> Option<Figure> {
    let whole = caps.get(0)?;
    let number = caps.name("number")?;
    let before = &text[..whole.start()];

    let mut start = whole.start();
    let mut negative = false;

    if let Some(sign) = caps.name("sign") {
        let after_term = before
            .trim_end()
            .chars()
            .last()
            .map_or(false, |c| c.is_alphanumeric() || c == ')' || c == '%');
        if after_term {
            // Range separator. A range whose first end was glued (`FY2025-26`)
            // is not a figure at all.
            if is_glued_term(preceding_term(before)) {
                return None;
            }
            start = caps
                .name("currency")
                .map_or(number.start(), |currency| currency.start());
        } else {
            negative = sign.as_str() != "+";
        }
    } else if caps.name("open").is_none() && glued(before.chars().last()) {
        return None;
    }

    if let Some(inner) = caps.name("inner_sign") {
        if inner.as_str() != "+" {
            negative = !negative;
        }
    }

    let scale = caps.name("scale").map(|m| m.as_str().to_ascii_lowercase());
    let percent = caps.name("percent").is_some();

    if scale.is_none() && !percent && glued(text[whole.end()..].chars().next()) {
        return None;
    }

    let mut end = whole.end();
    match (caps.name("open"), caps.name("close")) {
        (Some(_), Some(_)) if start == whole.start() => negative = true,
        (Some(open), _) if start == whole.start() => start = open.end(),
        (_, Some(close)) => end = close.start(),
        _ => {}
    }

    let digits: String = number.as_str().chars().filter(|c| *c != ',').collect();
    let mut value: f64 = digits.parse().ok()?;
    if let Some(scale) = &scale {
        value *= scale_factor(scale);
    }
    if negative {
        value = -value;
    }

    let currency = caps.name("currency").map(|m| currency_code(m.as_str()).to_string());
    let kind = if percent {
        FigureKind::Percent
    } else if currency.is_some() || scale.is_some() {
        FigureKind::Amount
    } else {
        FigureKind::Plain
    };

    Some(Figure {
        value,
        currency,
        kind,
        raw: text[start..end].trim().to_string(),
    })
}

/// The alphanumeric run that ends right before `before` (whitespace skipped)
fn preceding_term(before: &str) -> &str {
    let trimmed = before.trim_end();
    trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphanumeric())
        .last()
        .map_or("", |(i, _)| &trimmed[i..])
}

/// Letters and digits run together, like `FY2025` or `80C`
fn is_glued_term(term: &str) -> bool {
    term.chars().any(|c| c.is_ascii_digit()) && term.chars().any(char::is_alphabetic)
}

fn glued(neighbor: Option<char>) -> bool {
    neighbor.map_or(false, |c| c.is_alphanumeric() || c == '_')
}

fn scale_factor(word: &str) -> f64 {
    match word.trim_end_matches('s') {
        "lakh" => 1e5,
        "crore" => 1e7,
        "million" => 1e6,
        "billion" => 1e9,
        _ => 1.0,
    }
}

fn currency_code(marker: &str) -> &'static str {
    match marker {
        "$" | "USD" => "USD",
        "€" => "EUR",
        "£" => "GBP",
        _ => "INR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_with_grouping() {
        let figures = extract_figures("The standard deduction is Rs 75,000.");
        assert_eq!(figures.len(), 1);
        assert_eq!(figures[0].value, 75_000.0);
        assert_eq!(figures[0].currency.as_deref(), Some("INR"));
        assert_eq!(figures[0].kind, FigureKind::Amount);
        assert_eq!(figures[0].raw, "Rs 75,000");
    }

    #[test]
    fn test_indian_grouping_and_symbols() {
        assert_eq!(parse_amount("₹15,00,000"), Some(1_500_000.0));
        assert_eq!(parse_amount("$1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("£20"), Some(20.0));
        assert_eq!(parse_amount("INR 500"), Some(500.0));
        assert_eq!(parse_amount("Rs. 10"), Some(10.0));
    }

    #[test]
    fn test_scale_words() {
        assert_eq!(parse_amount("Rs 4 lakh"), Some(400_000.0));
        assert_eq!(parse_amount("2 crores"), Some(20_000_000.0));
        assert_eq!(parse_amount("$3.5 billion"), Some(3_500_000_000.0));
        assert_eq!(extract_figures("7 Million")[0].kind, FigureKind::Amount);
    }

    #[test]
    fn test_range_hyphen_is_not_a_sign() {
        let figures = extract_figures("Rs 0- Rs 4 lakh: Nil");
        assert_eq!(figures.len(), 2);
        assert_eq!(figures[0].value, 0.0);
        assert_eq!(figures[1].value, 400_000.0);
        assert_eq!(figures[1].raw, "Rs 4 lakh");

        let years: Vec<f64> = extract_figures("FY 2025-26").iter().map(|f| f.value).collect();
        assert_eq!(years, vec![2025.0, 26.0]);
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(parse_amount("-$500"), Some(-500.0));
        assert_eq!(parse_amount("(1,200)"), Some(-1200.0));
        assert_eq!(parse_amount("Net loss: −42"), Some(-42.0));
    }

    #[test]
    fn test_sign_after_currency_marker() {
        let rupees = extract_figures("Rs -1,200");
        assert_eq!(rupees.len(), 1);
        assert_eq!(rupees[0].value, -1200.0);
        assert_eq!(rupees[0].currency.as_deref(), Some("INR"));
        assert_eq!(rupees[0].kind, FigureKind::Amount);
        assert_eq!(rupees[0].raw, "Rs -1,200");

        assert_eq!(parse_amount("INR -50"), Some(-50.0));
        assert_eq!(parse_amount("Rs. +75"), Some(75.0));

        let dollars = extract_figures("$-300");
        assert_eq!(dollars.len(), 1);
        assert_eq!(dollars[0].value, -300.0);
        assert_eq!(dollars[0].currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_range_from_glued_start_is_dropped() {
        assert!(extract_figures("FY2025-26").is_empty());
        assert!(extract_figures("Section 80C-80D").is_empty());

        let years: Vec<f64> = extract_figures("AY 2026-27").iter().map(|f| f.value).collect();
        assert_eq!(years, vec![2026.0, 27.0]);
    }

    #[test]
    fn test_percent() {
        let figures = extract_figures("14% from FY 2025-26, previously 10%.");
        let percents: Vec<f64> = figures
            .iter()
            .filter(|f| f.kind == FigureKind::Percent)
            .map(|f| f.value)
            .collect();
        assert_eq!(percents, vec![14.0, 10.0]);
    }

    #[test]
    fn test_glued_numbers_are_ignored() {
        assert!(extract_figures("Section 80C and 5th slab").is_empty());
    }

    #[test]
    fn test_parse_amount_rejects_non_figures() {
        assert_eq!(parse_amount("N/A"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("5 and 6"), None);
    }
}

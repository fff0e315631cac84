//! Cell Coercion Module
//! Turns loosely formatted spreadsheet cells into numbers and dates.

use chrono::{NaiveDate, NaiveDateTime};

/// Currency tokens stripped before parsing (matched lowercase, longest first).
const CURRENCY_TOKENS: [&str; 2] = ["nok", "kr"];

/// Accepted date layouts, day-first for the separated forms.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d.%m.%y", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

fn is_ignorable(c: char) -> bool {
    c.is_whitespace()
        || matches!(c, '\u{a0}' | '\u{202f}' | '\'' | '$' | '€' | '£' | '¥')
}

/// Parse a spreadsheet cell as a number.
///
/// Whitespace, currency symbols and the `kr`/`NOK` tokens are stripped.
/// Returns `None` (missing) for anything that is not a number afterwards.
pub fn parse_number(raw: &str) -> Option<f64> {
    let mut text = raw.trim().to_lowercase();

    // "1 200,-" is a common way of writing whole kroner
    for suffix in [",-", ".-"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            text = stripped.to_string();
        }
    }
    for token in CURRENCY_TOKENS {
        text = text.replace(token, "");
    }

    let cleaned: String = text.chars().filter(|c| !is_ignorable(*c)).collect();
    let (negative, body) = split_sign(&cleaned);

    if body.is_empty()
        || !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',')
        || !body.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }

    let canonical = canonical_decimal(body)?;
    let value: f64 = canonical.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('\u{2212}') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

/// Rewrite digits with `.`/`,` separators into a string `f64::from_str` accepts.
fn canonical_decimal(body: &str) -> Option<String> {
    let dots = body.matches('.').count();
    let commas = body.matches(',').count();

    match (dots, commas) {
        (0, 0) => Some(body.to_string()),
        (_, 0) if dots == 1 => Some(body.to_string()),
        (_, 0) => Some(body.replace('.', "")),
        (0, 1) => {
            let decimals = body.len() - body.find(',')? - 1;
            if decimals == 3 {
                Some(body.replace(',', ""))
            } else {
                Some(body.replace(',', "."))
            }
        }
        (0, _) => Some(body.replace(',', "")),
        _ => {
            // Both present: the separator that appears last is the decimal one
            let last_dot = body.rfind('.')?;
            let last_comma = body.rfind(',')?;
            let (decimal, thousands, decimal_count) = if last_dot > last_comma {
                ('.', ',', dots)
            } else {
                (',', '.', commas)
            };
            if decimal_count > 1 {
                return None;
            }
            Some(body.replace(thousands, "").replace(decimal, "."))
        }
    }
}

/// Parse a date cell. Unrecognized layouts yield `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

//! Number formatting for metric cards and tables.
//! Thousands are separated with commas and amounts rounded to whole units.

/// Group the integer digits of `value` (rounded) with commas.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// `1,234 kr`; the suffix is omitted when empty.
pub fn format_amount(value: f64, suffix: &str) -> String {
    let number = format_thousands(value);
    if suffix.is_empty() {
        number
    } else {
        format!("{} {}", number, suffix)
    }
}

/// Signed amount, e.g. `+100 kr` / `-50 kr`.
pub fn format_delta(value: f64, suffix: &str) -> String {
    let amount = format_amount(value, suffix);
    if value.round() > 0.0 {
        format!("+{}", amount)
    } else {
        amount
    }
}

/// Counts keep up to two decimals when they are not whole.
pub fn format_count(value: f64) -> String {
    let value = (value * 100.0).round() / 100.0;
    if value.fract() == 0.0 || !value.is_finite() {
        format_thousands(value)
    } else {
        let whole = format_thousands(value.trunc());
        let fraction = format!("{:.2}", value.fract().abs());
        // "0.25" -> ".25"
        let sign = if value < 0.0 && value.trunc() == 0.0 { "-" } else { "" };
        format!("{}{}{}", sign, whole, &fraction[1..])
    }
}

/// Ratio as a signed percentage with one decimal, e.g. `+12.5 %`.
pub fn format_percent(ratio: f64) -> String {
    let pct = ratio * 100.0;
    if pct > 0.0 {
        format!("+{:.1} %", pct)
    } else {
        format!("{:.1} %", pct)
    }
}

/// Plain cell rendering for tables: whole numbers without decimals.
pub fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format_count(v),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1234567.4), "1,234,567");
        assert_eq!(format_thousands(-2150.6), "-2,151");
        assert_eq!(format_thousands(f64::NAN), "-");
    }

    #[test]
    fn amounts_carry_suffix() {
        assert_eq!(format_amount(2150.0, "kr"), "2,150 kr");
        assert_eq!(format_amount(2150.0, ""), "2,150");
    }

    #[test]
    fn deltas_are_signed() {
        assert_eq!(format_delta(100.0, "kr"), "+100 kr");
        assert_eq!(format_delta(-50.0, "kr"), "-50 kr");
        assert_eq!(format_delta(0.0, "kr"), "0 kr");
    }

    #[test]
    fn counts_and_cells() {
        assert_eq!(format_count(1200.0), "1,200");
        assert_eq!(format_count(1200.5), "1,200.50");
        assert_eq!(format_count(-0.25), "-0.25");
        assert_eq!(format_count(1.999), "2");
        assert_eq!(format_cell(None), "");
        assert_eq!(format_cell(Some(42.0)), "42");
    }

    #[test]
    fn percentages() {
        assert_eq!(format_percent(0.125), "+12.5 %");
        assert_eq!(format_percent(-0.1), "-10.0 %");
    }
}

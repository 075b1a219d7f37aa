use crate::filters::Currency;

/// Round half away from zero to `decimals` places.
fn round_to(val: f64, decimals: u8) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (val * factor).round() / factor
}

/// pt-BR digit grouping: `1234567` -> `1.234.567`.
fn group_thousands(int_part: &str) -> String {
    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped.chars().rev().collect()
}

/// Format a non-negative decimal with pt-BR separators: `1.234,56`.
fn decimal(abs: f64, decimals: u8) -> String {
    let fixed = format!("{:.*}", decimals as usize, round_to(abs, decimals));
    match fixed.split_once('.') {
        Some((int_part, dec_part)) => format!("{},{dec_part}", group_thousands(int_part)),
        None => group_thousands(&fixed),
    }
}

/// Format an amount in the given currency with `precision` decimal places:
/// `R$ 1.234,56`, `-US$ 12,00`.
pub fn currency(val: f64, currency: Currency, precision: u8) -> String {
    let sign = if round_to(val, precision) < 0.0 { "-" } else { "" };
    format!("{sign}{} {}", currency.symbol(), decimal(val.abs(), precision))
}

/// Abbreviated currency for chart labels. Millions keep one decimal (`R$ 1,3M`),
/// thousands none (`R$ 980k`); anything smaller falls back to the full
/// two-decimal form. Independent of the precision filter.
pub fn compact_currency(val: f64, cur: Currency) -> String {
    let abs = val.abs();
    let sign = if val < 0.0 { "-" } else { "" };
    // 999.999 rounds up to a thousand thousands; show it as millions instead.
    if abs >= 1_000_000.0 || round_to(abs / 1_000.0, 0) >= 1_000.0 {
        format!("{sign}{} {}M", cur.symbol(), decimal(abs / 1_000_000.0, 1))
    } else if abs >= 1_000.0 {
        format!("{sign}{} {}k", cur.symbol(), decimal(abs / 1_000.0, 0))
    } else {
        currency(val, cur, 2)
    }
}

/// `12.345` -> `12,3%`
pub fn percent(val: f64, decimals: u8) -> String {
    let sign = if round_to(val, decimals) < 0.0 { "-" } else { "" };
    format!("{sign}{}%", decimal(val.abs(), decimals))
}

/// Percentage with an explicit sign: `+4,8%`, `-2,0%`.
pub fn signed_percent(val: f64) -> String {
    if round_to(val, 1) > 0.0 {
        format!("+{}", percent(val, 1))
    } else {
        percent(val, 1)
    }
}

/// Relative change from `previous` to `current`, in percent. `None` when there
/// is no base to compare against.
pub fn pct_delta(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous.abs() * 100.0)
    }
}

pub fn number(n: i64) -> String {
    let grouped = group_thousands(&n.unsigned_abs().to_string());
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_formatting() {
        assert_eq!(currency(1234.56, Currency::Brl, 2), "R$ 1.234,56");
        assert_eq!(currency(-500.0, Currency::Brl, 2), "-R$ 500,00");
        assert_eq!(currency(0.0, Currency::Brl, 2), "R$ 0,00");
        assert_eq!(currency(1000000.99, Currency::Usd, 2), "US$ 1.000.000,99");
        assert_eq!(currency(42.1, Currency::Eur, 2), "€ 42,10");
    }

    #[test]
    fn test_currency_honours_precision() {
        assert_eq!(currency(1234.567, Currency::Brl, 0), "R$ 1.235");
        assert_eq!(currency(1234.567, Currency::Brl, 1), "R$ 1.234,6");
        assert_eq!(currency(-0.004, Currency::Brl, 2), "R$ 0,00");
    }

    #[test]
    fn test_compact_millions() {
        assert_eq!(compact_currency(1_250_000.0, Currency::Brl), "R$ 1,3M");
        assert_eq!(compact_currency(2_000_000.0, Currency::Brl), "R$ 2,0M");
        assert_eq!(compact_currency(-1_460_000.0, Currency::Usd), "-US$ 1,5M");
    }

    #[test]
    fn test_compact_thousands() {
        assert_eq!(compact_currency(980_000.0, Currency::Brl), "R$ 980k");
        assert_eq!(compact_currency(1_000.0, Currency::Brl), "R$ 1k");
        assert_eq!(compact_currency(999_499.0, Currency::Brl), "R$ 999k");
        assert_eq!(compact_currency(999_999.0, Currency::Brl), "R$ 1,0M");
        assert_eq!(compact_currency(-999_500.0, Currency::Brl), "-R$ 1,0M");
    }

    #[test]
    fn test_compact_small_values_use_full_format() {
        assert_eq!(compact_currency(500.0, Currency::Brl), "R$ 500,00");
        assert_eq!(compact_currency(999.5, Currency::Eur), "€ 999,50");
    }

    #[test]
    fn test_percent_and_delta() {
        assert_eq!(percent(12.345, 1), "12,3%");
        assert_eq!(signed_percent(4.76), "+4,8%");
        assert_eq!(signed_percent(-2.0), "-2,0%");
        assert_eq!(signed_percent(0.01), "0,0%");
        assert!((pct_delta(110.0, 100.0).unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(pct_delta(5.0, 0.0), None);
        let d = pct_delta(-50.0, -100.0).unwrap();
        assert!((d - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_number_grouping() {
        assert_eq!(number(0), "0");
        assert_eq!(number(1234), "1.234");
        assert_eq!(number(-1234567), "-1.234.567");
    }
}

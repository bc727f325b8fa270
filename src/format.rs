//! Human-readable magnitude formatting for report tables

const SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

/// Format a number with 3 significant digits and a K/M/B/T magnitude suffix.
///
/// `1234.0 -> "1.23K"`, `999.0 -> "999"`, `1_000_000.0 -> "1M"`, `0.0 -> "0"`.
/// Non-finite values print as `"nan"` / `"inf"`.
pub fn human_format(num: f64) -> String {
    if num.is_nan() {
        return "nan".to_string();
    }
    if num.is_infinite() {
        return if num > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }

    let mut num = round_significant(num, 3);
    let mut magnitude = 0;
    while num.abs() >= 1000.0 && magnitude < SUFFIXES.len() - 1 {
        magnitude += 1;
        num /= 1000.0;
    }

    let digits = format!("{:.6}", num);
    let digits = digits.trim_end_matches('0').trim_end_matches('.');
    // -0.0 would otherwise print as "-0"
    let digits = if digits == "-0" { "0" } else { digits };
    format!("{}{}", digits, SUFFIXES[magnitude])
}

/// Round to `digits` significant digits via exact decimal formatting
fn round_significant(num: f64, digits: usize) -> f64 {
    if num == 0.0 {
        return 0.0;
    }
    format!("{:.*e}", digits.saturating_sub(1), num)
        .parse()
        .unwrap_or(num)
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

//! Currency text the way hand-entered balances look upstream.

/// Format whole cents as `$1,234.56`.
///
/// # Examples
///
/// ```
/// use demo_data::format_currency;
///
/// assert_eq!(format_currency(123_456), "$1,234.56");
/// assert_eq!(format_currency(5), "$0.05");
/// ```
#[must_use]
pub fn format_currency(cents: u64) -> String {
    let dollars = cents.div_euclid(100);
    let rest = cents.rem_euclid(100);
    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len().div_euclid(3));
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index).rem_euclid(3) == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("${grouped}.{rest:02}")
}

//! Human-readable values for badge reasons

/// `1234.5` → `"$1,234.50"`
pub fn dollars(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// `0.5` → `"50.0%"`
pub fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollars() {
        assert_eq!(dollars(0.0), "$0.00");
        assert_eq!(dollars(5.0), "$5.00");
        assert_eq!(dollars(999.999), "$1,000.00");
        assert_eq!(dollars(1234.5), "$1,234.50");
        assert_eq!(dollars(1234567.0), "$1,234,567.00");
        assert_eq!(dollars(-42.1), "-$42.10");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.9), "90.0%");
        assert_eq!(percent(0.3), "30.0%");
        assert_eq!(percent(0.0), "0.0%");
    }
}

//! Cost parser.

/// Sentinel for a cost that can never be selected as a minimum.
pub const INVALID_COST: f64 = f64::INFINITY;

/// Parse a raw cost value into a finite non-negative number.
///
/// Everything except ASCII digits and `.` is stripped first, so currency
/// symbols, thousands separators and units are ignored. An empty result, more
/// than one decimal point, or a failed parse yields [`INVALID_COST`].
pub fn parse_cost(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() || cleaned.matches('.').count() > 1 {
        return INVALID_COST;
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => INVALID_COST,
    }
}

/// Check whether a parsed cost is usable.
pub fn is_valid_cost(cost: f64) -> bool {
    cost.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_currency_formatting() {
        assert_eq!(parse_cost("$12.50"), 12.50);
        assert_eq!(parse_cost("₹ 1,250"), 1250.0);
        assert_eq!(parse_cost("  7 USD "), 7.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(parse_cost("12.5.3"), INVALID_COST);
        assert_eq!(parse_cost(""), INVALID_COST);
        assert_eq!(parse_cost("N/A"), INVALID_COST);
        assert_eq!(parse_cost("."), INVALID_COST);
        assert_eq!(parse_cost("NULL"), INVALID_COST);
    }

    #[test]
    fn test_partial_decimals() {
        assert_eq!(parse_cost("5."), 5.0);
        assert_eq!(parse_cost(".5"), 0.5);
    }

    #[test]
    fn test_sign_is_stripped() {
        // '-' is not a digit, so negative inputs come out non-negative
        assert_eq!(parse_cost("-4.25"), 4.25);
    }

    proptest! {
        #[test]
        fn parse_cost_is_total(raw in ".*") {
            let cost = parse_cost(&raw);
            prop_assert!(cost == INVALID_COST || (cost.is_finite() && cost >= 0.0));
        }

        #[test]
        fn parse_cost_reads_plain_decimals(whole in 0u32..1_000_000, cents in 0u32..100) {
            let raw = format!("${}.{:02}", whole, cents);
            let expected = format!("{}.{:02}", whole, cents).parse::<f64>().unwrap();
            prop_assert_eq!(parse_cost(&raw), expected);
        }
    }
}

//! Quantity to crate/bag conversion. Billing is always crate/bag denominated,
//! whatever unit a product line was entered in.

/// Unit types offered on a product line.
pub const UNIT_TYPES: [&str; 6] = ["kg", "bag", "crate", "carrate", "tons", "quintal"];

/// 50 kg per crate.
fn rate(unit_type: &str) -> f64 {
    match unit_type.trim().to_lowercase().as_str() {
        "kg" => 0.02,
        "bag" | "crate" | "carrate" => 1.0,
        "tons" => 20.0,
        "quintal" => 2.0,
        _ => 1.0,
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Crates/bags for `quantity` of `unit_type`, rounded to two places.
/// Unknown unit types convert one to one.
pub fn crates_bags(quantity: f64, unit_type: &str) -> f64 {
    round2(quantity * rate(unit_type))
}

/// Aggregate over already converted line values.
pub fn total_crates_bags<I>(lines: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    round2(lines.into_iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_with_fixed_rates() {
        assert_eq!(crates_bags(100.0, "kg"), 2.0);
        assert_eq!(crates_bags(500.0, "kg"), 10.0);
        assert_eq!(crates_bags(3.0, "tons"), 60.0);
        assert_eq!(crates_bags(4.0, "quintal"), 8.0);
        assert_eq!(crates_bags(7.0, "carrate"), 7.0);
    }

    #[test]
    fn unit_lookup_is_case_insensitive() {
        assert_eq!(crates_bags(100.0, "KG"), 2.0);
        assert_eq!(crates_bags(1.0, "Tons"), 20.0);
    }

    #[test]
    fn unknown_units_fall_back_to_one() {
        assert_eq!(crates_bags(5.0, "unknown"), 5.0);
        assert_eq!(crates_bags(5.0, ""), 5.0);
    }

    #[test]
    fn results_are_rounded_to_two_places() {
        assert_eq!(crates_bags(33.0, "kg"), 0.66);
        assert_eq!(crates_bags(1.0, "kg"), 0.02);
        assert_eq!(crates_bags(1.234, "bag"), 1.23);
    }

    #[test]
    fn aggregate_sums_line_values() {
        assert_eq!(total_crates_bags([10.0, 15.0]), 25.0);
        assert_eq!(total_crates_bags([0.1, 0.2]), 0.3);
        assert_eq!(total_crates_bags(Vec::<f64>::new()), 0.0);
    }
}

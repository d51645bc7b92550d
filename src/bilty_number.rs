use chrono::Utc;
use rand::Rng;

const PREFIX: &str = "BLT";

/// `BLT` + last six digits of the epoch milliseconds + a two digit random suffix.
///
/// Not unique on its own; the bilties table carries a unique index and the
/// create workflow draws again on collision.
pub fn generate_bilty_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = rand::thread_rng().gen_range(0..100);
    generate_bilty_number_at(millis, suffix)
}

pub fn generate_bilty_number_at(epoch_millis: i64, suffix: u8) -> String {
    format!("{PREFIX}{:06}{:02}", epoch_millis.rem_euclid(1_000_000), suffix % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_last_six_timestamp_digits_and_padded_suffix() {
        assert_eq!(generate_bilty_number_at(1_760_601_234_567, 7), "BLT23456707");
        assert_eq!(generate_bilty_number_at(1_000_000_000_042, 99), "BLT00004299");
    }

    #[test]
    fn generated_numbers_have_fixed_shape() {
        let number = generate_bilty_number();
        assert_eq!(number.len(), 11);
        assert!(number.starts_with("BLT"));
        assert!(number[3..].chars().all(|c| c.is_ascii_digit()));
    }
}

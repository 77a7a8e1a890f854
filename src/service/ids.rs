use rand::distr::{Alphanumeric, SampleString};

/// Length of a saved QR code's unique id.
pub const UNIQUE_ID_LEN: usize = 12;
/// Length of a generated short code.
pub const SHORT_CODE_LEN: usize = 8;
/// Fresh ids tried before giving up on a save.
pub const MAX_ID_ATTEMPTS: usize = 5;

/// Random URL-safe identifier made of ASCII letters and digits.
pub fn random_id(len: usize) -> String {
    Alphanumeric.sample_string(&mut rand::rng(), len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_alphanumeric_with_requested_length() {
        let id = random_id(UNIQUE_ID_LEN);
        assert_eq!(id.len(), UNIQUE_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(random_id(SHORT_CODE_LEN), random_id(SHORT_CODE_LEN));
    }
}

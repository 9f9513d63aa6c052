use proptest::prelude::*;
use totpwatch::{compute_code, remaining_fraction, remaining_seconds};

const SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

const BASE32_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

fn base32_secret() -> impl Strategy<Value = String> {
    // Multiples of 8 characters decode without trailing bits.
    (1usize..5)
        .prop_flat_map(|blocks| {
            prop::collection::vec(prop::sample::select(BASE32_ALPHABET), blocks * 8)
        })
        .prop_map(|bytes| String::from_utf8(bytes).unwrap())
}

proptest! {
    #[test]
    fn code_is_deterministic(secret in base32_secret(), t in 0u64..4_000_000_000) {
        prop_assert_eq!(
            compute_code(&secret, t, 30, 6).unwrap(),
            compute_code(&secret, t, 30, 6).unwrap()
        );
    }

    #[test]
    fn code_is_stable_within_window(window in 0u64..100_000_000, a in 0u64..30, b in 0u64..30) {
        prop_assert_eq!(
            compute_code(SECRET, window * 30 + a, 30, 6).unwrap(),
            compute_code(SECRET, window * 30 + b, 30, 6).unwrap()
        );
    }

    #[test]
    fn code_has_requested_width(t in any::<u32>(), digits in 1u32..=9) {
        let code = compute_code(SECRET, u64::from(t), 30, digits).unwrap();

        prop_assert_eq!(code.len(), digits as usize);
        prop_assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn remaining_seconds_never_zero(t in any::<u64>(), step in 1u64..=3600) {
        let remaining = remaining_seconds(t, step);

        prop_assert!(remaining >= 1 && remaining <= step);
        prop_assert_eq!(t % step + remaining, step);
    }

    #[test]
    fn remaining_fraction_in_unit_interval(millis in 0u64..u64::MAX / 2, step in 1u64..=3600) {
        let fraction = remaining_fraction(millis, step);

        prop_assert!(fraction > 0.0 && fraction <= 1.0);
    }
}

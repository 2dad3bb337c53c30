//! Short token generation and the adaptive length policy.

use rand::Rng;

/// Symbols tokens are drawn from: digits then lowercase ASCII letters
pub const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

const BASE: usize = ALPHABET.len();

/// Generates a random token of exactly `length` symbols from [`ALPHABET`].
///
/// Uses the thread-local RNG; tokens are public identifiers, not secrets.
pub fn generate(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..BASE)] as char)
        .collect()
}

/// Token length for a table holding `table_size` records.
///
/// Below `36^min_length` records the length is `min_length + 1`. From there
/// it grows with `floor(log36(table_size))`, so it steps up at every power
/// of 36 and never falls below `min_length + 1`.
pub fn length_for(table_size: usize, min_length: usize) -> usize {
    let growth = match BASE.checked_pow(min_length as u32) {
        Some(threshold) if table_size >= threshold => (table_size.ilog(BASE) as usize).max(1),
        _ => 1,
    };
    min_length + growth
}

/// Returns `true` if every symbol of `token` belongs to [`ALPHABET`].
pub fn is_well_formed(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_generate_exact_length_and_alphabet() {
        for length in [1, 3, 4, 12] {
            let token = generate(length);
            assert_eq!(token.len(), length);
            assert!(is_well_formed(&token));
        }
    }

    #[test]
    fn test_generate_zero_length_is_empty() {
        assert_eq!(generate(0), "");
    }

    #[test]
    fn test_length_for_small_tables() {
        assert_eq!(length_for(0, 2), 3);
        assert_eq!(length_for(1, 2), 3);
        assert_eq!(length_for(1295, 2), 3);
    }

    #[test]
    fn test_length_for_steps_at_powers_of_36() {
        assert_eq!(length_for(1296, 2), 4);
        assert_eq!(length_for(1300, 2), 4);
        assert_eq!(length_for(46_655, 2), 4);
        assert_eq!(length_for(46_656, 2), 5);
    }

    #[test]
    fn test_length_for_zero_minimum_still_yields_one() {
        assert_eq!(length_for(0, 0), 1);
        assert_eq!(length_for(5, 0), 1);
        assert_eq!(length_for(36, 0), 1);
        assert_eq!(length_for(1296, 0), 2);
    }

    #[test]
    fn test_length_for_huge_minimum_does_not_overflow() {
        assert_eq!(length_for(usize::MAX, 40), 41);
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("a0z9"));
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("ABC"));
        assert!(!is_well_formed("a-b"));
    }

    proptest! {
        #[test]
        fn prop_length_is_monotonic(a in 0usize..5_000_000, b in 0usize..5_000_000, min in 0usize..4) {
            let (small, large) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(length_for(small, min) <= length_for(large, min));
        }

        #[test]
        fn prop_length_never_below_floor(size in 0usize..usize::MAX, min in 0usize..8) {
            prop_assert!(length_for(size, min) >= min + 1);
        }
    }
}

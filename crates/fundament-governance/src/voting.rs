//! Vote-weight computation.
//!
//! Voting power = floor(sqrt(stake)). A member must contribute four times
//! as much capital to double their influence, which damps large-holder
//! dominance while staying strictly monotonic in stake.

use fundament_types::Amount;

/// Integer square root using Newton's method.
/// Returns floor(sqrt(n)). Exact for all inputs.
pub fn integer_sqrt(n: Amount) -> Amount {
    if n <= 1 {
        return n;
    }

    // Initial guess n/2 + 1 >= sqrt(n); avoids overflow of n + 1 at u128::MAX.
    let mut x = n / 2 + 1;
    let mut y = (x + n / x) / 2;

    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }

    x
}

/// Voting power for a given stake.
///
/// Pure and deterministic; used both to weight ballots and to report a
/// member's current influence.
pub fn voting_power(stake: Amount) -> Amount {
    integer_sqrt(stake)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_integer_sqrt_small_values() {
        assert_eq!(integer_sqrt(0), 0);
        assert_eq!(integer_sqrt(1), 1);
        assert_eq!(integer_sqrt(2), 1);
        assert_eq!(integer_sqrt(3), 1);
        assert_eq!(integer_sqrt(4), 2);
        assert_eq!(integer_sqrt(9), 3);
        assert_eq!(integer_sqrt(15), 3); // floor(sqrt(15)) = 3
        assert_eq!(integer_sqrt(16), 4);
        assert_eq!(integer_sqrt(100), 10);
    }

    #[test]
    fn test_voting_power_monotonic() {
        let mut last = 0;
        for stake in 0..1_000u128 {
            let p = voting_power(stake);
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn test_sublinear_influence() {
        // Quadrupling stake doubles influence, not quadruples it.
        assert_eq!(voting_power(100), 10);
        assert_eq!(voting_power(400), 20);
        assert_eq!(voting_power(10_000), 100);
    }

    #[test]
    fn test_large_input() {
        let p = voting_power(u128::MAX);
        assert!(p.checked_mul(p).map_or(true, |sq| sq <= u128::MAX));
        // (p+1)^2 must overflow or exceed the input
        assert!((p + 1).checked_mul(p + 1).is_none());
    }

    proptest! {
        #[test]
        fn prop_sqrt_bounds(stake in any::<u128>()) {
            let p = voting_power(stake);
            prop_assert!(p.checked_mul(p).map_or(false, |sq| sq <= stake));
            // (p+1)^2 either overflows u128 or strictly exceeds the stake
            prop_assert!((p + 1)
                .checked_mul(p + 1)
                .map_or(true, |sq| sq > stake));
        }
    }
}

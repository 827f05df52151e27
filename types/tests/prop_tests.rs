use proptest::prelude::*;

use skillswap_types::{Credits, SettlementParams, Timestamp};

proptest! {
    /// has_expired agrees with manual arithmetic.
    #[test]
    fn timestamp_has_expired_correct(
        start in 0u64..500_000,
        duration in 1u64..500_000,
        offset in 0u64..1_000_000,
    ) {
        let t = Timestamp::new(start);
        let now = Timestamp::new(start.saturating_add(offset));
        prop_assert_eq!(t.has_expired(duration, now), offset >= duration);
    }

    /// An expiry computed with plus_secs is reached exactly when has_expired says so.
    #[test]
    fn plus_secs_matches_has_expired(
        start in 0u64..1_000_000,
        window in 1u64..200_000,
        at in 0u64..2_000_000,
    ) {
        let created = Timestamp::new(start);
        let expires_at = created.plus_secs(window);
        let now = Timestamp::new(at);
        prop_assert_eq!(now >= expires_at, created.has_expired(window, now));
        prop_assert_eq!(expires_at.remaining_from(now), (start + window).saturating_sub(at));
    }

    /// checked_sub returns None when b > a.
    #[test]
    fn credits_checked_sub_underflow(a in 0u64..1_000_000, b in 0u64..1_000_000) {
        let result = Credits::new(a).checked_sub(Credits::new(b));
        if b > a {
            prop_assert!(result.is_none());
        } else {
            prop_assert_eq!(result, Some(Credits::new(a - b)));
        }
    }

    /// Only multiples of the step inside [min, max] are reportable.
    #[test]
    fn duration_domain_is_stepped(mins in 0u32..1_000) {
        let p = SettlementParams::default();
        let expected = (15..=480).contains(&mins) && mins % 15 == 0;
        prop_assert_eq!(p.is_valid_duration(mins), expected);
    }
}

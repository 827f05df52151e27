//! Time formatting helpers.

use skillswap_types::Timestamp;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// "expires in 23h 59m" / "expired".
pub fn format_expiry(expires_at: Timestamp, now: Timestamp) -> String {
    match expires_at.remaining_from(now) {
        0 => "expired".to_string(),
        secs => format!("expires in {}", format_duration(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_scale() {
        assert_eq!(format_duration(42), "42s");
        assert_eq!(format_duration(125), "2m 5s");
        assert_eq!(format_duration(3 * 3600 + 120), "3h 2m");
        assert_eq!(format_duration(86400 + 3600), "1d 1h");
    }

    #[test]
    fn expiry_text() {
        let expires = Timestamp::new(86_400);
        assert_eq!(format_expiry(expires, Timestamp::new(60)), "expires in 23h 59m");
        assert_eq!(format_expiry(expires, Timestamp::new(86_400)), "expired");
    }
}

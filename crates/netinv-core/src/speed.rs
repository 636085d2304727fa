//! Human-readable interface speeds.

/// Line rates reported by legacy WAN interfaces, shown by circuit name.
const LEGACY_RATES: &[(u64, &str)] = &[
    (1_536_000, "T1"),
    (1_544_000, "T1"),
    (3_072_000, "Dual T1"),
    (3_088_000, "Dual T1"),
    (44_210_000, "T3"),
    (44_736_000, "T3"),
    (45_045_000, "DS3"),
    (46_359_642, "DS3"),
    (149_760_000, "ATM on OC-3"),
    (155_000_000, "OC-3"),
    (155_519_000, "OC-3"),
    (155_520_000, "OC-3"),
    (599_040_000, "ATM on OC-12"),
    (622_000_000, "OC-12"),
    (622_080_000, "OC-12"),
    (2_488_320_000, "OC-48"),
    (9_953_280_000, "OC-192"),
];

/// Formats a speed in bits per second.
///
/// ```
/// use netinv_core::format_speed;
///
/// assert_eq!(format_speed(1_544_000), "T1");
/// assert_eq!(format_speed(10_000_000_000), "10.0 Gbps");
/// assert_eq!(format_speed(100_000_000), "100 Mbps");
/// ```
pub fn format_speed(bps: u64) -> String {
    if let Some((_, name)) = LEGACY_RATES.iter().find(|(rate, _)| *rate == bps) {
        return (*name).to_string();
    }

    if bps > 9_999_999_999_999 {
        format!("{} Tbps", bps / 1_000_000_000_000)
    } else if bps > 999_999_999_999 {
        format!("{:.1} Tbps", bps as f64 / 1e12)
    } else if bps >= 1_000_000_000 {
        format!("{:.1} Gbps", bps as f64 / 1e9)
    } else if bps >= 1_000_000 {
        format!("{} Mbps", bps / 1_000_000)
    } else if bps >= 1_000 {
        format!("{} Kbps", bps / 1_000)
    } else {
        format!("{} bps", bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_rates_take_precedence() {
        assert_eq!(format_speed(1_544_000), "T1");
        assert_eq!(format_speed(1_536_000), "T1");
        assert_eq!(format_speed(46_359_642), "DS3");
        assert_eq!(format_speed(149_760_000), "ATM on OC-3");
        assert_eq!(format_speed(622_080_000), "OC-12");
        assert_eq!(format_speed(9_953_280_000), "OC-192");
    }

    #[test]
    fn test_bands() {
        assert_eq!(format_speed(0), "0 bps");
        assert_eq!(format_speed(100), "100 bps");
        assert_eq!(format_speed(999), "999 bps");
        assert_eq!(format_speed(1_000), "1 Kbps");
        assert_eq!(format_speed(64_000), "64 Kbps");
        assert_eq!(format_speed(10_000_000), "10 Mbps");
        assert_eq!(format_speed(999_999_999), "999 Mbps");
        assert_eq!(format_speed(1_000_000_000), "1.0 Gbps");
        assert_eq!(format_speed(2_500_000_000), "2.5 Gbps");
        assert_eq!(format_speed(400_000_000_000), "400.0 Gbps");
        assert_eq!(format_speed(1_000_000_000_000), "1.0 Tbps");
        assert_eq!(format_speed(1_600_000_000_000), "1.6 Tbps");
        assert_eq!(format_speed(40_000_000_000_000), "40 Tbps");
    }
}

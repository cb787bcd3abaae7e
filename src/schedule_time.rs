//! Handling of the "HH:MM" schedule times stored in the traffic and trips
//! tables. Overnight runs wrap past midnight, so an arrival time can be
//! numerically earlier than the departure it belongs to.

/// Parse a 24h "HH:MM" (or "HH:MM:SS", seconds ignored) time into minutes
/// since midnight. Returns None for anything out of range or malformed.
pub fn minutes_since_midnight(time: &str) -> Option<u32> {
    let mut parts = time.split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;

    if hours > 23 || minutes > 59 {
        return None;
    }

    Some(hours * 60 + minutes)
}

/// Minutes from `departure` to `arrival`, adding a day when the run
/// crosses midnight.
pub fn duration_minutes(departure: &str, arrival: &str) -> Option<u32> {
    let dep = minutes_since_midnight(departure)?;
    let mut arr = minutes_since_midnight(arrival)?;

    if arr < dep {
        arr += 24 * 60;
    }

    Some(arr - dep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hh_mm() {
        assert_eq!(minutes_since_midnight("00:00"), Some(0));
        assert_eq!(minutes_since_midnight("07:45"), Some(465));
        assert_eq!(minutes_since_midnight("23:59"), Some(1439));
    }

    #[test]
    fn tolerates_seconds() {
        assert_eq!(minutes_since_midnight("07:45:30"), Some(465));
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert_eq!(minutes_since_midnight("24:00"), None);
        assert_eq!(minutes_since_midnight("12:60"), None);
        assert_eq!(minutes_since_midnight("12"), None);
        assert_eq!(minutes_since_midnight("ab:cd"), None);
        assert_eq!(minutes_since_midnight(""), None);
    }

    #[test]
    fn duration_same_day() {
        assert_eq!(duration_minutes("08:00", "10:30"), Some(150));
    }

    #[test]
    fn duration_across_midnight() {
        // 23:10 to 01:05 the next day
        assert_eq!(duration_minutes("23:10", "01:05"), Some(115));
    }

    #[test]
    fn duration_with_bad_input() {
        assert_eq!(duration_minutes("08:00", "25:00"), None);
    }
}

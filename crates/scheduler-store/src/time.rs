//! Time-of-day string helpers for the `calendar` table, grounded in the
//! original `time_to_minutes("08:00:00")` conversion.

/// Parse a `"HH:MM:SS"` time-of-day string into minutes since midnight.
pub(crate) fn minutes_to_hms(value: &str) -> Result<u32, String> {
    let mut parts = value.splitn(3, ':');
    let hour: u32 = parts
        .next()
        .ok_or_else(|| format!("malformed time '{value}'"))?
        .parse()
        .map_err(|_| format!("malformed time '{value}'"))?;
    let minute: u32 = parts
        .next()
        .ok_or_else(|| format!("malformed time '{value}'"))?
        .parse()
        .map_err(|_| format!("malformed time '{value}'"))?;
    Ok(hour * 60 + minute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hms() {
        assert_eq!(minutes_to_hms("08:00:00").unwrap(), 480);
        assert_eq!(minutes_to_hms("17:30:00").unwrap(), 1050);
    }

    #[test]
    fn rejects_malformed_time() {
        assert!(minutes_to_hms("not-a-time").is_err());
    }
}

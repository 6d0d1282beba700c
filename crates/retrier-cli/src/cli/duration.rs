//! Parse human durations such as `250ms`, `2s`, `5m`, `1h`.

use std::time::Duration;

/// Parse a duration argument. A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return Err(format!("invalid duration '{}': expected a number", s));
    }
    let n: u64 = digits
        .parse()
        .map_err(|e| format!("invalid duration '{}': {}", s, e))?;
    let d = match unit {
        "ms" => Duration::from_millis(n),
        "" | "s" => Duration::from_secs(n),
        "m" => Duration::from_secs(n.saturating_mul(60)),
        "h" => Duration::from_secs(n.saturating_mul(3600)),
        other => {
            return Err(format!(
                "invalid duration '{}': unknown unit '{}' (use ms, s, m or h)",
                s, other
            ))
        }
    };
    Ok(d)
}

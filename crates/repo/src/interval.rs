use crate::error::{ErrorKind, Result};
use std::time::Duration;

/// Refresh interval used when a repository declares none, or an invalid one.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Parse a duration such as `24h`, `1h30m`, `1.5h`, `90s` or `250ms`.
///
/// Accepted units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. Every
/// number needs a unit, except for a bare `0`. Negative durations are
/// rejected.
pub fn parse_interval(text: &str) -> Result<Duration> {
    let invalid = || exn::Exn::from(ErrorKind::InvalidInterval(text.to_string()));
    let mut rest = text.trim();
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let split = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(split);
        let split = tail.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(split);
        let unit: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "h" => 3_600 * NANOS_PER_SECOND,
            _ => return Err(invalid()),
        };
        let nanos = scaled(number, unit).ok_or_else(invalid)?;
        total = total.checked_add(nanos).ok_or_else(invalid)?;
        rest = tail;
    }
    let seconds = u64::try_from(total / NANOS_PER_SECOND).map_err(|_| invalid())?;
    // The remainder is below one billion, so it always fits.
    let nanos = (total % NANOS_PER_SECOND) as u32;
    Ok(Duration::new(seconds, nanos))
}

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// `number` (digits with at most one `.`) times `unit`, truncated to whole
/// nanoseconds.
fn scaled(number: &str, unit: u128) -> Option<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() || fraction.contains('.') {
        return None;
    }
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    // Digits past nanosecond precision of an hour cannot matter.
    let fraction = &fraction[..fraction.len().min(18)];
    let mut value = whole.checked_mul(unit)?;
    if !fraction.is_empty() {
        let digits: u128 = fraction.parse().ok()?;
        value = value.checked_add(digits.checked_mul(unit)? / 10u128.pow(fraction.len() as u32))?;
    }
    Some(value)
}

use std::time::Duration;

use crate::error::ConfigError;

const NANOS_PER_SEC: u128 = 1_000_000_000;
const MAX_FRACTION_DIGITS: usize = 18;

/// Parses a duration such as `30`, `250ms`, `1.5s` or `1m30s`.
///
/// A bare integer is read as seconds. Text durations are a sequence of
/// `<number><unit>` segments with units `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`.
///
/// # Errors
///
/// Returns an error for empty input, unknown units, malformed numbers, or
/// values that overflow.
pub fn parse_duration_value(value: &str) -> Result<Duration, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::DurationEmpty);
    }

    if trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        let secs: u64 = trimmed
            .parse()
            .map_err(|err| ConfigError::InvalidDurationNumber {
                value: value.to_owned(),
                source: err,
            })?;
        return Ok(Duration::from_secs(secs));
    }

    let mut total_nanos: u128 = 0;
    let mut rest = trimmed;
    while !rest.is_empty() {
        let number_len = rest
            .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(ConfigError::InvalidDurationFormat {
                value: value.to_owned(),
            });
        }
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail
            .find(|ch: char| ch.is_ascii_digit() || ch == '.')
            .unwrap_or(tail.len());
        let (unit, remaining) = tail.split_at(unit_len);
        let unit_nanos = unit_to_nanos(unit).ok_or_else(|| ConfigError::InvalidDurationUnit {
            value: value.to_owned(),
            unit: unit.to_owned(),
        })?;
        let segment = scale_segment(number, unit_nanos, value)?;
        total_nanos = total_nanos
            .checked_add(segment)
            .ok_or_else(|| ConfigError::DurationOverflow {
                value: value.to_owned(),
            })?;
        rest = remaining;
    }

    let secs = u64::try_from(total_nanos.checked_div(NANOS_PER_SEC).unwrap_or(0)).map_err(
        |_overflow| ConfigError::DurationOverflow {
            value: value.to_owned(),
        },
    )?;
    let sub_nanos = u32::try_from(total_nanos.checked_rem(NANOS_PER_SEC).unwrap_or(0)).unwrap_or(0);
    Ok(Duration::new(secs, sub_nanos))
}

fn unit_to_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3_600 * NANOS_PER_SEC),
        _ => None,
    }
}

fn scale_segment(number: &str, unit_nanos: u128, original: &str) -> Result<u128, ConfigError> {
    let overflow = || ConfigError::DurationOverflow {
        value: original.to_owned(),
    };
    let invalid = || ConfigError::InvalidDurationFormat {
        value: original.to_owned(),
    };

    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };
    if fraction.contains('.') || (whole.is_empty() && fraction.is_empty()) {
        return Err(invalid());
    }
    if fraction.len() > MAX_FRACTION_DIGITS {
        return Err(invalid());
    }

    let whole_value: u128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|err| ConfigError::InvalidDurationNumber {
                value: original.to_owned(),
                source: err,
            })?
    };
    let mut nanos = whole_value.checked_mul(unit_nanos).ok_or_else(overflow)?;

    if !fraction.is_empty() {
        let fraction_value: u128 =
            fraction
                .parse()
                .map_err(|err| ConfigError::InvalidDurationNumber {
                    value: original.to_owned(),
                    source: err,
                })?;
        let digits = u32::try_from(fraction.len()).map_err(|_overflow| invalid())?;
        let divisor = 10u128.checked_pow(digits).ok_or_else(overflow)?;
        let fraction_nanos = fraction_value
            .checked_mul(unit_nanos)
            .ok_or_else(overflow)?
            .checked_div(divisor)
            .unwrap_or(0);
        nanos = nanos.checked_add(fraction_nanos).ok_or_else(overflow)?;
    }

    Ok(nanos)
}

//! Compact human durations such as `25m`, `1h30m` or `90s`.

use std::time::Duration;

use crate::error::DurationError;

/// Parse `[<N>h][<N>m][<N>s]` into a [`Duration`].
///
/// Each component is optional but may appear at most once, and only in the
/// order hours, minutes, seconds. Surrounding whitespace is ignored and units
/// are case-insensitive. An empty string is zero.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let text = input.trim().to_lowercase();
    let mut total: u64 = 0;
    let mut num = String::new();
    // Rank of the last unit seen; units must strictly increase in rank.
    let mut last_rank = 0u8;

    for c in text.chars() {
        let (rank, scale) = match c {
            '0'..='9' => {
                num.push(c);
                continue;
            }
            'h' => (1, 3600),
            'm' => (2, 60),
            's' => (3, 1),
            _ => {
                return Err(DurationError::UnknownUnit { input: input.into(), unit: c });
            }
        };

        if num.is_empty() {
            return Err(DurationError::MissingNumber { input: input.into(), unit: c });
        }
        if rank <= last_rank {
            return Err(DurationError::OutOfOrder { input: input.into(), unit: c });
        }
        last_rank = rank;

        let overflow = || DurationError::Overflow { input: input.into() };
        let value: u64 = num.parse().map_err(|_| overflow())?;
        total = value
            .checked_mul(scale)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(overflow)?;
        num.clear();
    }

    if !num.is_empty() {
        return Err(DurationError::MissingUnit { input: input.into() });
    }

    Ok(Duration::from_secs(total))
}

/// Render whole seconds as `HH:MM:SS`. Hours grow past two digits as needed.
pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

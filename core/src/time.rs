//! Order timestamp parsing.
//!
//! Input timestamps are ISO-8601 local date-times without an offset
//! (`2020-04-25T16:00:00`, optionally followed by `.` and fractional digits).
//! They are read as UTC and truncated to whole seconds.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

const ORDER_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Errors from [`parse_order_time`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The date-time part did not match `YYYY-MM-DDTHH:MM:SS`.
    #[error("Invalid order timestamp {value:?}: {source}")]
    Invalid {
        /// The offending input.
        value: String,
        /// Parser failure.
        source: chrono::ParseError,
    },

    /// The fractional part was empty or not all digits.
    #[error("Invalid fractional seconds in order timestamp {value:?}")]
    Fraction {
        /// The offending input.
        value: String,
    },
}

/// Parse an order timestamp, discarding fractional seconds.
///
/// # Errors
///
/// Returns [`TimestampError`] if the input is not a date-time of the form
/// `YYYY-MM-DDTHH:MM:SS[.digits]`.
///
/// # Example
///
/// ```
/// use kitchen_sim_core::time::parse_order_time;
///
/// let at = parse_order_time("2020-04-25T16:00:00.31415926535")?;
/// assert_eq!(at.timestamp(), 1_587_830_400);
/// # Ok::<(), kitchen_sim_core::time::TimestampError>(())
/// ```
pub fn parse_order_time(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };

    let fraction_ok =
        fraction.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()));
    if !fraction_ok {
        return Err(TimestampError::Fraction {
            value: value.to_string(),
        });
    }

    NaiveDateTime::parse_from_str(whole, ORDER_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| TimestampError::Invalid {
            value: value.to_string(),
            source,
        })
}

//! Delimited simulator/log rows.
//!
//! ```text
//! 12:00:00.000 sim | 1.0 | 2.5 | 50 | 100 | 1.7 | 201.1 | 0 | 50 | 2 | 50 | 100
//! └─ token 0 ─────┘  └─ tokens 1.. are positional columns ──────────────────┘
//! ```

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::LineError;

/// Layout of the leading timestamp: `HH:MM:SS.mmm`.
pub const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.3f";

/// A row that passed the token-count and timestamp checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine<'a> {
    timestamp: NaiveDateTime,
    tokens: Vec<&'a str>,
}

/// Split and validate one row.
///
/// Rows with two or fewer tokens, or whose first token does not start with a
/// valid timestamp, are rejected as a whole. The time of day is anchored to
/// `date`.
pub fn parse_line<'a>(
    line: &'a str,
    delimiter: &str,
    date: NaiveDate,
) -> Result<ParsedLine<'a>, LineError> {
    let tokens: Vec<&str> = line.split(delimiter).map(str::trim).collect();
    if tokens.len() <= 2 {
        return Err(LineError::TooFewTokens {
            count: tokens.len(),
        });
    }

    let stamp = tokens[0].split(' ').next().unwrap_or_default();
    let time = parse_time(stamp).ok_or_else(|| LineError::BadTimestamp {
        token: stamp.to_string(),
    })?;

    Ok(ParsedLine {
        timestamp: date.and_time(time),
        tokens,
    })
}

/// chrono accepts a missing or 1-9 digit fraction for `%.3f`; the layout
/// wants exactly three.
fn parse_time(stamp: &str) -> Option<NaiveTime> {
    let (_, millis) = stamp.rsplit_once('.')?;
    if millis.len() != 3 || !millis.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
}

impl<'a> ParsedLine<'a> {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Number of tokens, timestamp included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Numeric value of a column.
    ///
    /// `None` when the column is past the end of the row. A token that is not
    /// a number reads as `0.0`; downstream dashboards rely on that.
    pub fn value_at(&self, column: usize) -> Option<f32> {
        self.tokens
            .get(column)
            .map(|token| token.parse::<f32>().unwrap_or(0.0))
    }
}

/// Reasons a delimited telemetry line is dropped.
#[derive(Debug, thiserror::Error)]
pub enum LineError {
    /// The line did not split into more than two tokens.
    #[error("line has {count} tokens, need more than 2")]
    TooFewTokens { count: usize },

    /// The leading timestamp does not match `HH:MM:SS.mmm`.
    #[error("invalid timestamp {token:?}, expected HH:MM:SS.mmm")]
    BadTimestamp { token: String },
}

/// A field-mapping table is not one-to-one.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("{table} table maps {key} more than once")]
    DuplicateKey { table: &'static str, key: String },

    #[error("{table} table targets {target} more than once")]
    DuplicateTarget { table: &'static str, target: String },
}

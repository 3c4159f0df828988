/// Errors from parsing user- or config-supplied pipeline values.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A table-name string outside the known entity kinds.
    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),

    /// A date-bucket string outside the known buckets.
    #[error("Unknown date bucket: {0} (expected one of all, today, yesterday, last_week, last_month)")]
    UnknownDateBucket(String),
}

use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The target bucket was not configured.
    #[error("`collection.bucket` must be set")]
    MissingBucket,
    /// The checkpoint location was not configured.
    #[error("`checkpoint.path` must be set")]
    MissingCheckpointPath,
    /// A field has a value outside of its accepted range.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}

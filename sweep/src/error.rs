//! Error types and result definitions for sweep operations.
//!
//! Every fallible operation of the pipeline returns a [`SweepError`], which carries a
//! classification ([`ErrorKind`]), a static description, an optional dynamic detail, the
//! originating error and the callsite where it was created. The pipeline only ever reports one
//! error per run (the first one), so there is no aggregated representation.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for sweep operations using [`SweepError`] as the error type.
pub type SweepResult<T> = Result<T, SweepError>;

/// Specific categories of errors that can occur during a sweep.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Source Errors
    ListingFailed,
    DecodeFailed,

    // Mutation Errors
    MutationFailed,

    // Checkpoint Errors
    CheckpointReadFailed,
    CheckpointWriteFailed,

    // Coordination Errors
    Cancelled,
    TaskPanic,
    InvalidState,

    // Configuration Errors
    ConfigError,

    // Unknown / Uncategorized
    Unknown,

    // Used by tests that inject faults through fail points.
    #[cfg(feature = "failpoints")]
    FailpointTriggered,
}

impl ErrorKind {
    /// Returns `true` for the kind raised by tasks that stopped because of a cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ErrorKind::Cancelled)
    }
}

/// Detailed payload stored inside a [`SweepError`].
#[derive(Debug)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Backtrace,
}

/// Main error type for sweep operations.
///
/// The payload is reference counted, so cloning is cheap. The group supervising the pipeline
/// relies on this to hand out the first recorded error.
#[derive(Debug, Clone)]
pub struct SweepError {
    payload: Arc<ErrorPayload>,
}

impl SweepError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.payload.kind
    }

    /// Returns the static description of this error.
    pub fn description(&self) -> &str {
        &self.payload.description
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.payload.detail.as_deref()
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> &Backtrace {
        &self.payload.backtrace
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.payload.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// Only effective on errors that were not cloned yet, which is always the case when used
    /// through [`crate::sweep_error!`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let Some(payload) = Arc::get_mut(&mut self.payload) {
            payload.source = Some(Arc::new(source));
        }

        self
    }

    /// Creates a [`SweepError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        SweepError {
            payload: Arc::new(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Backtrace::capture(),
            }),
        }
    }
}

impl PartialEq for SweepError {
    fn eq(&self, other: &SweepError) -> bool {
        self.kind() == other.kind()
    }
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let payload = &self.payload;
        let location = payload.location;
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            payload.kind,
            payload.description,
            location.file(),
            location.line(),
            location.column()
        )?;

        write_detail(payload.detail.as_deref(), f)?;
        write_backtrace(&payload.backtrace, f)?;

        Ok(())
    }
}

impl error::Error for SweepError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.payload
            .source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

/// Writes the captured backtrace with indentation.
fn write_backtrace(backtrace: &Backtrace, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rendered_backtrace = format!("{backtrace}");
    if rendered_backtrace.trim().is_empty() || rendered_backtrace.contains("disabled backtrace") {
        return Ok(());
    }

    write!(f, "\n  Backtrace:")?;
    for line in rendered_backtrace.lines() {
        if line.trim().is_empty() {
            write!(f, "\n    ")?;
        } else {
            write!(f, "\n    {line}")?;
        }
    }

    Ok(())
}

/// Writes the detail block with indentation.
fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Some(detail) = detail else {
        return Ok(());
    };

    if detail.trim().is_empty() {
        return write!(f, "\n  Detail: <empty>");
    }

    write!(f, "\n  Detail:")?;
    for line in detail.lines() {
        if line.trim().is_empty() {
            write!(f, "\n    ")?;
        } else {
            write!(f, "\n    {line}")?;
        }
    }

    Ok(())
}

/// Creates a [`SweepError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for SweepError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> SweepError {
        SweepError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`SweepError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for SweepError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> SweepError {
        SweepError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::sweep_error;

    #[test]
    fn display_contains_kind_description_and_detail() {
        let err = sweep_error!(
            ErrorKind::DecodeFailed,
            "Item key could not be decoded",
            "raw key: 'a%ZZ'"
        );

        let rendered = err.to_string();
        assert!(rendered.starts_with("[DecodeFailed] Item key could not be decoded @ "));
        assert!(rendered.contains("Detail:\n    raw key: 'a%ZZ'"));
        assert_eq!(err.detail(), Some("raw key: 'a%ZZ'"));
    }

    #[test]
    fn source_is_preserved_across_clones() {
        let err = sweep_error!(
            ErrorKind::CheckpointWriteFailed,
            "Checkpoint could not be written",
            source: io::Error::other("disk full")
        );
        let cloned = err.clone();

        let source = error::Error::source(&cloned).unwrap();
        assert_eq!(source.to_string(), "disk full");
        assert_eq!(err, cloned);
    }

    #[test]
    fn location_points_at_the_callsite() {
        let err = sweep_error!(ErrorKind::Unknown, "Something happened");

        assert!(err.location().file().ends_with("error.rs"));
    }
}

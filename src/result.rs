//! Outcome of a dispatch attempt

use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
};

use crate::BoxError;

/// The step in which a dispatch attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The relay could not be reached, or the connection could not be secured
    Connection,
    /// The relay refused the credentials, or none could be presented
    Authentication,
    /// The relay refused the message, or the connection dropped while sending
    Transmission,
}

impl FailureKind {
    fn description(self) -> &'static str {
        match self {
            Self::Connection => "connection failure",
            Self::Authentication => "authentication failure",
            Self::Transmission => "transmission failure",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Why a dispatch attempt failed
pub struct DispatchError {
    kind: FailureKind,
    source: Option<BoxError>,
}

impl DispatchError {
    pub(crate) fn new<E: Into<BoxError>>(kind: FailureKind, source: Option<E>) -> Self {
        Self {
            kind,
            source: source.map(Into::into),
        }
    }

    pub(crate) fn connection<E: Into<BoxError>>(e: E) -> Self {
        Self::new(FailureKind::Connection, Some(e))
    }

    pub(crate) fn authentication<E: Into<BoxError>>(e: E) -> Self {
        Self::new(FailureKind::Authentication, Some(e))
    }

    pub(crate) fn transmission<E: Into<BoxError>>(e: E) -> Self {
        Self::new(FailureKind::Transmission, Some(e))
    }

    /// The step that failed
    pub fn kind(&self) -> FailureKind {
        self.kind
    }
}

impl fmt::Debug for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("courier::DispatchError");

        builder.field("kind", &self.kind);

        if let Some(source) = &self.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => {
                let text = source.to_string();
                if text.trim().is_empty() {
                    f.write_str(self.kind.description())
                } else {
                    f.write_str(&text)
                }
            }
            None => f.write_str(self.kind.description()),
        }
    }
}

impl StdError for DispatchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| {
            let r: &(dyn StdError + 'static) = &**e;
            r
        })
    }
}

/// What a dispatch attempt reports back
///
/// [`error_message`](Self::error_message) is empty exactly when the attempt
/// succeeded.
#[derive(Debug)]
#[must_use = "a dispatch may have failed"]
pub struct DispatchResult {
    succeeded: bool,
    error_message: String,
    failure: Option<DispatchError>,
}

impl DispatchResult {
    /// A successful attempt
    pub fn success() -> Self {
        Self {
            succeeded: true,
            error_message: String::new(),
            failure: None,
        }
    }

    /// Whether the relay accepted the message
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Human-readable failure reason, empty on success
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// The step that failed, `None` on success
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(DispatchError::kind)
    }

    /// Converts into a `Result`, keeping the underlying error
    pub fn into_result(self) -> Result<(), DispatchError> {
        match self.failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl From<DispatchError> for DispatchResult {
    fn from(error: DispatchError) -> Self {
        Self {
            succeeded: false,
            error_message: error.to_string(),
            failure: Some(error),
        }
    }
}

impl From<Result<(), DispatchError>> for DispatchResult {
    fn from(result: Result<(), DispatchError>) -> Self {
        match result {
            Ok(()) => Self::success(),
            Err(error) => error.into(),
        }
    }
}

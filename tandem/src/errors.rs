use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::{atomic, Atomic};

/// Error kinds for tandem operations
///
/// Each kind names one category of failure so callers can branch on
/// [`TandemError::kind`] instead of matching on messages.
///
/// # Examples
///
/// ```rust
/// use tandem::errors::{ErrorKind, TandemError, TandemResult};
///
/// fn example() -> TandemResult<()> {
///     Err(TandemError::new("nothing staged", ErrorKind::NoEphemeralUpdates))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::NoEphemeralUpdates);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Ephemeral staging
    /// A regular transaction targeted a container that still has staged ephemeral edits
    UncommittedEphemeralUpdate,
    /// Commit or discard was requested for a container with nothing staged
    NoEphemeralUpdates,

    // Transaction construction
    /// The same container was listed twice in one transaction
    DuplicateContainer,
    /// A user supplied mutator reported a failure
    MutatorFailed,

    // Patch engine
    /// A patch does not fit the value it is applied to
    InvalidPatch,
    /// Error encoding or decoding patch data
    EncodingError,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::UncommittedEphemeralUpdate => write!(f, "Uncommitted ephemeral update"),
            ErrorKind::NoEphemeralUpdates => write!(f, "No ephemeral updates"),
            ErrorKind::DuplicateContainer => write!(f, "Duplicate container"),
            ErrorKind::MutatorFailed => write!(f, "Mutator failed"),
            ErrorKind::InvalidPatch => write!(f, "Invalid patch"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom tandem error type.
///
/// `TandemError` carries a message, an [`ErrorKind`], an optional cause and the
/// backtrace captured at construction.
///
/// # Examples
///
/// ```rust
/// use tandem::errors::{ErrorKind, TandemError};
///
/// let cause = TandemError::new("index 4 is out of bounds", ErrorKind::InvalidPatch);
/// let err = TandemError::new_with_cause("undo failed", ErrorKind::InvalidPatch, cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct TandemError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<TandemError>>,
    backtrace: Atomic<Backtrace>,
}

impl TandemError {
    /// Creates a new `TandemError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        TandemError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `TandemError` that keeps `cause` in its chain.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: TandemError) -> Self {
        TandemError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&TandemError> {
        self.cause.as_deref()
    }
}

impl Display for TandemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for TandemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // message with the cause chain, or the captured stack trace at the root
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for TandemError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for tandem operations.
///
/// `TandemResult<T>` is shorthand for `Result<T, TandemError>`.
pub type TandemResult<T> = Result<T, TandemError>;

impl From<serde_json::Error> for TandemError {
    fn from(err: serde_json::Error) -> Self {
        TandemError::new(
            &format!("JSON encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<anyhow::Error> for TandemError {
    fn from(err: anyhow::Error) -> Self {
        TandemError::new(&format!("Mutator failed: {:#}", err), ErrorKind::MutatorFailed)
    }
}

impl From<String> for TandemError {
    fn from(msg: String) -> Self {
        TandemError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for TandemError {
    fn from(msg: &str) -> Self {
        TandemError::new(msg, ErrorKind::InternalError)
    }
}

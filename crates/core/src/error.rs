use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};

use agency_model::{ErrorKind as RemoteErrorKind, ModelProviderError};

/// A boxed error returned by user callbacks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The remote provider or the transport failed.
    Remote(RemoteErrorKind),
    /// The provider answered without any choice.
    NoChoice,
    /// The model requested a function that is not registered.
    FunctionNotFound,
    /// A registered function returned an error.
    FunctionFailed,
    /// The result of a function could not be serialized.
    Serialization,
    /// The streaming callback returned an error.
    Callback,
    /// The operation cannot handle the given input.
    InvalidInput,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Remote(kind) => write!(f, "remote error ({kind})"),
            ErrorKind::NoChoice => write!(f, "no choice"),
            ErrorKind::FunctionNotFound => write!(f, "function not found"),
            ErrorKind::FunctionFailed => write!(f, "function call failed"),
            ErrorKind::Serialization => write!(f, "marshal function result"),
            ErrorKind::Callback => write!(f, "callback failed"),
            ErrorKind::InvalidInput => write!(f, "invalid input"),
        }
    }
}

/// The error type of operations.
///
/// Operations never retry: the first error aborts the whole execution and
/// is returned as is.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
    source: Option<BoxError>,
}

impl Error {
    #[inline]
    fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            reason: None,
            source: None,
        }
    }

    /// Creates an error from a provider error, keeping its kind.
    pub fn remote<E: ModelProviderError>(err: E) -> Self {
        Self {
            kind: ErrorKind::Remote(err.kind()),
            reason: None,
            source: Some(Box::new(err)),
        }
    }

    /// Creates a new error with the `NoChoice` kind.
    #[inline]
    pub fn no_choice() -> Self {
        Self::new(ErrorKind::NoChoice)
    }

    /// Creates a new error with the `FunctionNotFound` kind.
    #[inline]
    pub fn function_not_found(name: &str) -> Self {
        Self::new(ErrorKind::FunctionNotFound)
            .with_reason(format!("function not found: {name}"))
    }

    /// Creates a new error with the `FunctionFailed` kind.
    #[inline]
    pub fn function_failed(name: &str, source: BoxError) -> Self {
        Self::new(ErrorKind::FunctionFailed)
            .with_reason(format!("call function {name}"))
            .with_source(source)
    }

    /// Creates a new error with the `Serialization` kind.
    #[inline]
    pub fn serialization(name: &str, source: serde_json::Error) -> Self {
        Self::new(ErrorKind::Serialization)
            .with_reason(format!("marshal result of function {name}"))
            .with_source(Box::new(source))
    }

    /// Creates a new error with the `Callback` kind.
    #[inline]
    pub fn callback(source: BoxError) -> Self {
        Self::new(ErrorKind::Callback).with_source(source)
    }

    /// Creates a new error with the `InvalidInput` kind.
    #[inline]
    pub fn invalid_input<S: Into<String>>(reason: S) -> Self {
        Self::new(ErrorKind::InvalidInput).with_reason(reason)
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    fn with_source(mut self, source: BoxError) -> Self {
        self.source = Some(source);
        self
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())?;
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

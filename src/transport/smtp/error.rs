//! Error type for the SMTP connector

use std::{error::Error as StdError, fmt};

use lettre::transport::smtp::{response::Code, Error as RelayError};

use crate::BoxError;

/// The errors that may occur when talking to an SMTP relay
///
/// Most of them are reported by the relay, or by lettre's SMTP client on
/// its behalf. The others come from courier itself: a connection URL it
/// cannot read, or an exchange it refuses to continue.
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
}

#[derive(Debug)]
pub(crate) enum Kind {
    /// Reported by the SMTP client, see the source
    Relay,
    /// Courier gave up on the exchange
    Client,
    /// The connection URL could not be read
    Url,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
            }),
        }
    }

    /// Returns true if the error was reported by the SMTP client
    pub fn is_relay(&self) -> bool {
        matches!(self.inner.kind, Kind::Relay)
    }

    /// Returns true if courier gave up on the exchange
    pub fn is_client(&self) -> bool {
        matches!(self.inner.kind, Kind::Client)
    }

    /// Returns true if the connection URL could not be read
    pub fn is_url(&self) -> bool {
        matches!(self.inner.kind, Kind::Url)
    }

    /// Returns true if the relay answered with a transient (4xx) error
    pub fn is_transient(&self) -> bool {
        self.relay_error().is_some_and(RelayError::is_transient)
    }

    /// Returns true if the relay answered with a permanent (5xx) error
    pub fn is_permanent(&self) -> bool {
        self.relay_error().is_some_and(RelayError::is_permanent)
    }

    /// Returns true if the error is caused by a timeout
    pub fn is_timeout(&self) -> bool {
        self.relay_error().is_some_and(RelayError::is_timeout)
    }

    /// The reply code, when the relay refused a command
    pub fn status(&self) -> Option<Code> {
        self.relay_error().and_then(RelayError::status)
    }

    fn relay_error(&self) -> Option<&RelayError> {
        self.inner.source.as_ref()?.downcast_ref()
    }
}

impl From<RelayError> for Error {
    fn from(err: RelayError) -> Self {
        Error::new(Kind::Relay, Some(err))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("courier::transport::smtp::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(source) = &self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.inner.kind, &self.inner.source) {
            // lettre already names the failure
            (Kind::Relay, Some(source)) => return fmt::Display::fmt(source, f),
            (Kind::Relay, None) => f.write_str("smtp error")?,
            (Kind::Client, _) => f.write_str("client error")?,
            (Kind::Url, _) => f.write_str("invalid connection url")?,
        };

        if let Some(e) = &self.inner.source {
            write!(f, ": {e}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| {
            let r: &(dyn StdError + 'static) = &**e;
            r
        })
    }
}

pub(crate) fn client<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Client, Some(e))
}

pub(crate) fn url<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Url, Some(e))
}

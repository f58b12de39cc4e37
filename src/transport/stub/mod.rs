//! The stub connector never touches the network. Every step succeeds unless
//! it was told to fail, and every call is recorded in an event log shared
//! between clones. It can be useful for testing purposes.
//!
//! ```
//! use courier::{
//!     transport::stub::{StubConnector, StubEvent},
//!     Dispatcher, MessageEnvelope, TransportParameters,
//! };
//!
//! let connector = StubConnector::new().fail_send("552 mailbox full");
//! let dispatcher = Dispatcher::with_connector(connector.clone());
//!
//! let message = MessageEnvelope::new("a@x.com", "b@y.com", "Hi", "Test");
//! let result = dispatcher.dispatch(&message, &TransportParameters::new("localhost", 25));
//!
//! assert!(!result.succeeded());
//! assert_eq!(result.error_message(), "552 mailbox full");
//! assert_eq!(connector.events().last(), Some(&StubEvent::Close));
//! ```

use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
    sync::{Arc, Mutex, PoisonError},
};

use lettre::address::Envelope;

use super::{Connector, Credentials, Security, Session, TransportParameters};

/// One call made through the stub, in the order it happened
///
/// Calls are recorded whether they succeed or fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubEvent {
    /// A connection was attempted
    Connect {
        /// Relay host
        host: String,
        /// Relay port
        port: u16,
        /// Whether the session would be encrypted
        encrypted: bool,
    },
    /// Credentials were presented
    Authenticate {
        /// Username presented
        username: String,
        /// Whether the session was encrypted at that point
        encrypted: bool,
    },
    /// A message was handed over
    Send {
        /// Reverse path, empty for a null sender
        from: String,
        /// Forward paths, comma separated
        to: String,
        /// Whether the session was encrypted at that point
        encrypted: bool,
    },
    /// The session was closed
    Close,
}

/// Error returned by the stub, carrying the configured text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubError {
    message: String,
}

impl StubError {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}

impl Display for StubError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for StubError {}

type EventLog = Arc<Mutex<Vec<StubEvent>>>;

fn record(events: &EventLog, event: StubEvent) {
    events
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(event);
}

/// Connector that accepts (or refuses) every step without any network
#[derive(Debug, Clone, Default)]
pub struct StubConnector {
    connect_error: Option<String>,
    authentication_error: Option<String>,
    send_error: Option<String>,
    plaintext_only: bool,
    events: EventLog,
}

impl StubConnector {
    /// Creates a connector that accepts every step
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every connection attempt fail with `message`
    pub fn fail_connect<S: Into<String>>(mut self, message: S) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    /// Makes every authentication attempt fail with `message`
    pub fn fail_authentication<S: Into<String>>(mut self, message: S) -> Self {
        self.authentication_error = Some(message.into());
        self
    }

    /// Makes every send fail with `message`
    pub fn fail_send<S: Into<String>>(mut self, message: S) -> Self {
        self.send_error = Some(message.into());
        self
    }

    /// Hands back unencrypted sessions even when encryption was requested,
    /// like a relay that never offers TLS
    pub fn plaintext_only(mut self) -> Self {
        self.plaintext_only = true;
        self
    }

    /// A snapshot of every call made so far, through this connector or any
    /// of its clones
    pub fn events(&self) -> Vec<StubEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Connector for StubConnector {
    type Session = StubSession;

    fn connect(&self, parameters: &TransportParameters) -> Result<StubSession, StubError> {
        let encrypted = !self.plaintext_only && parameters.security_mode() != Security::None;
        record(
            &self.events,
            StubEvent::Connect {
                host: parameters.host().to_owned(),
                port: parameters.port(),
                encrypted,
            },
        );

        if let Some(message) = &self.connect_error {
            return Err(StubError::new(message));
        }

        Ok(StubSession {
            encrypted,
            authentication_error: self.authentication_error.clone(),
            send_error: self.send_error.clone(),
            events: Arc::clone(&self.events),
        })
    }
}

/// Session handed out by [`StubConnector`]
#[derive(Debug)]
pub struct StubSession {
    encrypted: bool,
    authentication_error: Option<String>,
    send_error: Option<String>,
    events: EventLog,
}

impl Session for StubSession {
    type Error = StubError;

    fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    fn authenticate(&mut self, credentials: &Credentials) -> Result<(), StubError> {
        record(
            &self.events,
            StubEvent::Authenticate {
                username: credentials.username().to_owned(),
                encrypted: self.encrypted,
            },
        );
        match &self.authentication_error {
            Some(message) => Err(StubError::new(message)),
            None => Ok(()),
        }
    }

    fn send(&mut self, envelope: &Envelope, _message: &[u8]) -> Result<(), StubError> {
        record(
            &self.events,
            StubEvent::Send {
                from: envelope
                    .from()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                to: envelope
                    .to()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                encrypted: self.encrypted,
            },
        );
        match &self.send_error {
            Some(message) => Err(StubError::new(message)),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> Result<(), StubError> {
        record(&self.events, StubEvent::Close);
        Ok(())
    }
}

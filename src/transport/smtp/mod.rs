//! The SMTP connector opens sessions to a relay using the SMTP protocol.
//!
//! The wire protocol itself is lettre's SMTP client, following [RFC
//! 5321](https://tools.ietf.org/html/rfc5321). The connector decides how the
//! connection is secured, and the session drives authentication, sending and
//! closing.
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use courier::{
//!     transport::{smtp::SmtpConnector, TransportParameters},
//!     Dispatcher, MessageEnvelope,
//! };
//!
//! let connector = SmtpConnector::new().timeout(Some(Duration::from_secs(10)));
//! let dispatcher = Dispatcher::with_connector(connector);
//!
//! let envelope = MessageEnvelope::new(
//!     ("Alice", "alice@example.com"),
//!     ("Bob", "bob@example.com"),
//!     "Hello",
//!     "Hi Bob",
//! );
//! let transport = TransportParameters::new("smtp.example.com", 587)
//!     .encryption(true)
//!     .authentication(true)
//!     .credentials("alice", "secret");
//!
//! let result = dispatcher.dispatch(&envelope, &transport);
//! if !result.succeeded() {
//!     eprintln!("not sent: {}", result.error_message());
//! }
//! ```

use std::{fmt, time::Duration};

pub use lettre::transport::smtp::{
    authentication::{Mechanism, DEFAULT_MECHANISMS},
    extension::ClientId,
};
use lettre::{
    address::Envelope,
    transport::smtp::{
        authentication::Credentials as SmtpCredentials,
        client::{SmtpConnection, TlsParameters},
        commands::Auth,
    },
};

pub use self::error::Error;
use crate::transport::{Connector, Credentials, Security, Session, TransportParameters};

pub(crate) mod connection_url;
mod error;

// Registered port numbers:
// https://www.iana.org/assignments/service-names-port-numbers/service-names-port-numbers.xhtml

/// Default smtp port
pub const SMTP_PORT: u16 = 25;
/// Default submission port
pub const SUBMISSION_PORT: u16 = 587;
/// Default submission over TLS port
///
/// Defined in [RFC8314](https://tools.ietf.org/html/rfc8314)
pub const SUBMISSIONS_PORT: u16 = 465;

/// Default timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Most `334` challenges answered in one authentication exchange
pub const MAX_CHALLENGES: usize = 10;

/// Opens SMTP sessions
///
/// Defaults are:
///
/// * The local hostname as `EHLO` name
/// * A 60 seconds timeout for connecting, reading and writing
/// * `PLAIN` then `LOGIN` authentication
#[derive(Debug, Clone)]
pub struct SmtpConnector {
    /// Name sent during EHLO
    hello_name: ClientId,
    /// Timeout applied to the connection and every command
    timeout: Option<Duration>,
    /// Accepted authentication mechanisms, tried in order
    authentication: Vec<Mechanism>,
}

impl Default for SmtpConnector {
    fn default() -> Self {
        Self {
            hello_name: ClientId::default(),
            timeout: Some(DEFAULT_TIMEOUT),
            authentication: DEFAULT_MECHANISMS.into(),
        }
    }
}

impl SmtpConnector {
    /// Creates a connector with the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name used during EHLO
    pub fn hello_name(mut self, name: ClientId) -> Self {
        self.hello_name = name;
        self
    }

    /// Set the timeout duration
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the authentication mechanisms to try, in order
    pub fn authentication(mut self, mechanisms: Vec<Mechanism>) -> Self {
        self.authentication = mechanisms;
        self
    }

    fn open(
        &self,
        parameters: &TransportParameters,
        tls_parameters: Option<&TlsParameters>,
    ) -> Result<SmtpConnection, Error> {
        let connection = SmtpConnection::connect(
            (parameters.host(), parameters.port()),
            self.timeout,
            &self.hello_name,
            tls_parameters,
            None,
        )?;
        Ok(connection)
    }

    fn starttls(
        &self,
        mut connection: SmtpConnection,
        tls_parameters: &TlsParameters,
    ) -> Result<SmtpConnection, Error> {
        match connection.starttls(tls_parameters, &self.hello_name) {
            Ok(()) => Ok(connection),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("STARTTLS failed, aborting connection: {}", err);
                connection.abort();
                Err(err.into())
            }
        }
    }
}

/// TLS settings for `host`: TLS 1.2 or newer, certificate checked against it
#[cfg(feature = "native-tls")]
fn tls_parameters(host: &str) -> Result<TlsParameters, Error> {
    use lettre::transport::smtp::client::TlsVersion;

    let tls_parameters = TlsParameters::builder(host.to_owned())
        .set_min_tls_version(TlsVersion::Tlsv12)
        .build_native()?;
    Ok(tls_parameters)
}

#[cfg(not(feature = "native-tls"))]
fn tls_parameters(_host: &str) -> Result<TlsParameters, Error> {
    Err(error::client(
        "encryption needs a TLS backend, enable the native-tls feature",
    ))
}

impl Connector for SmtpConnector {
    type Session = SmtpSession;

    fn connect(&self, parameters: &TransportParameters) -> Result<SmtpSession, Error> {
        let security = parameters.security_mode();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "connecting to {}:{} ({:?})",
            parameters.host(),
            parameters.port(),
            security
        );

        let connection = match security {
            Security::None => self.open(parameters, None)?,
            Security::Wrapper => {
                let tls_parameters = tls_parameters(parameters.host())?;
                self.open(parameters, Some(&tls_parameters))?
            }
            Security::Required => {
                let tls_parameters = tls_parameters(parameters.host())?;
                let connection = self.open(parameters, None)?;
                self.starttls(connection, &tls_parameters)?
            }
            Security::Opportunistic => {
                let connection = self.open(parameters, None)?;
                match tls_parameters(parameters.host()) {
                    Ok(tls_parameters) if connection.can_starttls() => {
                        self.starttls(connection, &tls_parameters)?
                    }
                    _ => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!("staying on a plaintext connection");
                        connection
                    }
                }
            }
        };

        Ok(SmtpSession {
            connection,
            mechanisms: self.authentication.clone(),
        })
    }
}

/// A live SMTP connection, obtained from [`SmtpConnector`]
pub struct SmtpSession {
    connection: SmtpConnection,
    mechanisms: Vec<Mechanism>,
}

impl SmtpSession {
    /// The underlying connection
    pub fn connection(&self) -> &SmtpConnection {
        &self.connection
    }
}

impl fmt::Debug for SmtpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSession")
            .field("server", self.connection.server_info())
            .field("encrypted", &self.connection.is_encrypted())
            .field("mechanisms", &self.mechanisms)
            .finish()
    }
}

impl Session for SmtpSession {
    type Error = Error;

    fn is_encrypted(&self) -> bool {
        self.connection.is_encrypted()
    }

    fn authenticate(&mut self, credentials: &Credentials) -> Result<(), Error> {
        let mechanism = self
            .connection
            .server_info()
            .get_auth_mechanism(&self.mechanisms)
            .ok_or_else(|| error::client("no compatible authentication mechanism was found"))?;
        let credentials = SmtpCredentials::new(
            credentials.username().to_owned(),
            credentials.password().to_owned(),
        );

        let mut response = self
            .connection
            .command(Auth::new(mechanism, credentials.clone(), None)?)?;

        let mut answered = 0;
        while response.has_code(334) {
            if answered == MAX_CHALLENGES {
                return Err(error::client("too many authentication challenges"));
            }
            answered += 1;
            response = self.connection.command(Auth::new_from_response(
                mechanism,
                credentials.clone(),
                &response,
            )?)?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "authenticated with {} after {} challenge(s)",
            mechanism,
            answered
        );
        Ok(())
    }

    fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), Error> {
        let _response = self.connection.send(envelope, message)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("message accepted: {:?}", _response.first_line());
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        // Already quit, or nothing left to talk to
        if self.connection.has_broken() {
            return Ok(());
        }
        self.connection.quit()?;
        Ok(())
    }
}

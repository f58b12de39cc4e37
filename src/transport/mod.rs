//! ### Reaching the relay
//!
//! [`TransportParameters`] describe where the relay is and how to talk to
//! it. A [`Connector`] turns them into a live [`Session`], which the
//! dispatcher then drives through authentication, sending and closing.
//!
//! The following connectors are available:
//!
//! * The [`SmtpConnector`](smtp::SmtpConnector) uses the SMTP protocol to reach the relay over
//!   the network. It is the default one.
//! * The [`StubConnector`](stub::StubConnector) accepts (or refuses) every step without any
//!   network, and records what happened. It is useful for testing.

use std::fmt::{self, Debug, Formatter};

use lettre::address::Envelope;

pub mod smtp;
pub mod stub;

/// How encryption is applied to the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Security {
    /// Plaintext connection only
    None,
    /// Start with a plaintext connection and use `STARTTLS` when available
    Opportunistic,
    /// Start with a plaintext connection and require `STARTTLS`
    Required,
    /// TLS from the first byte (implicit TLS)
    Wrapper,
}

/// Where the relay is, and how to talk to it
///
/// ```
/// use courier::TransportParameters;
///
/// let transport = TransportParameters::new("smtp.example.com", 587)
///     .encryption(true)
///     .authentication(true)
///     .credentials("u", "p");
/// assert_eq!(transport.port(), 587);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct TransportParameters {
    host: String,
    port: u16,
    use_encryption: bool,
    use_authentication: bool,
    username: String,
    password: String,
    security: Option<Security>,
}

impl TransportParameters {
    /// Parameters for `host:port`, with neither encryption nor
    /// authentication required
    pub fn new<H: Into<String>>(host: H, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            use_encryption: false,
            use_authentication: false,
            username: String::new(),
            password: String::new(),
            security: None,
        }
    }

    /// Builds parameters from a connection URL
    ///
    /// * `smtp://host[:port]`: plaintext, port 25 by default
    /// * `smtp://host[:port]?tls=required`: mandatory `STARTTLS`, port 587 by default
    /// * `smtp://host[:port]?tls=opportunistic`: `STARTTLS` when offered, port 587 by default
    /// * `smtps://host[:port]`: implicit TLS, port 465 by default
    ///
    /// A percent-encoded `user:password@` part switches authentication on.
    ///
    /// ```
    /// use courier::TransportParameters;
    ///
    /// let transport = TransportParameters::from_url("smtps://u:p@smtp.example.com")?;
    /// assert_eq!(transport.port(), 465);
    /// assert!(transport.use_encryption());
    /// assert!(transport.use_authentication());
    /// # Ok::<(), courier::transport::smtp::Error>(())
    /// ```
    pub fn from_url(connection_url: &str) -> Result<Self, smtp::Error> {
        smtp::connection_url::from_connection_url(connection_url)
    }

    /// Whether the connection must be secured before credentials or
    /// message data are sent
    pub fn encryption(mut self, use_encryption: bool) -> Self {
        self.use_encryption = use_encryption;
        self
    }

    /// Whether credentials are exchanged after connecting
    pub fn authentication(mut self, use_authentication: bool) -> Self {
        self.use_authentication = use_authentication;
        self
    }

    /// Sets the username and password, only used with authentication on
    pub fn credentials<U: Into<String>, P: Into<String>>(mut self, username: U, password: P) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Overrides how encryption is applied, see [`security_mode`](Self::security_mode)
    pub fn security(mut self, security: Security) -> Self {
        self.security = Some(security);
        self
    }

    /// The relay host name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The relay port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether encryption was requested
    pub fn use_encryption(&self) -> bool {
        self.use_encryption
    }

    /// Whether authentication was requested
    pub fn use_authentication(&self) -> bool {
        self.use_authentication
    }

    /// The username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password
    pub fn password(&self) -> &str {
        &self.password
    }

    /// How encryption is applied
    ///
    /// Unless overridden with [`security`](Self::security): without
    /// encryption the connection is upgraded only if the relay offers it
    /// ([`Security::Opportunistic`]), encryption on the submissions port
    /// (465) gives [`Security::Wrapper`], and encryption on any other port
    /// gives [`Security::Required`].
    pub fn security_mode(&self) -> Security {
        match (self.security, self.use_encryption, self.port) {
            (Some(security), _, _) => security,
            (None, false, _) => Security::Opportunistic,
            (None, true, smtp::SUBMISSIONS_PORT) => Security::Wrapper,
            (None, true, _) => Security::Required,
        }
    }

    /// The credentials to present, `None` when authentication is off
    pub fn credentials_for_auth(&self) -> Option<Credentials> {
        self.use_authentication
            .then(|| Credentials::new(self.username.clone(), self.password.clone()))
    }
}

impl Debug for TransportParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportParameters")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_encryption", &self.use_encryption)
            .field("use_authentication", &self.use_authentication)
            .field("username", &self.username)
            .field("security", &self.security_mode())
            .finish_non_exhaustive()
    }
}

/// A username and password presented to the relay
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// The username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether the username or the password is empty
    pub fn is_incomplete(&self) -> bool {
        self.username.is_empty() || self.password.is_empty()
    }
}

impl<U, P> From<(U, P)> for Credentials
where
    U: Into<String>,
    P: Into<String>,
{
    fn from((username, password): (U, P)) -> Self {
        Credentials::new(username.into(), password.into())
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Opens sessions to a relay
pub trait Connector {
    /// The session type produced
    type Session: Session;

    /// Connects to the relay described by `parameters`, applying encryption
    /// during or right after connecting
    ///
    /// When this returns an error, nothing is left open.
    fn connect(
        &self,
        parameters: &TransportParameters,
    ) -> Result<Self::Session, <Self::Session as Session>::Error>;
}

/// A live connection to a relay
pub trait Session {
    /// Error produced by the session
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether the session is currently encrypted
    fn is_encrypted(&self) -> bool;

    /// Exchanges credentials with the relay
    fn authenticate(&mut self, credentials: &Credentials) -> Result<(), Self::Error>;

    /// Sends one message
    fn send(&mut self, envelope: &Envelope, message: &[u8]) -> Result<(), Self::Error>;

    /// Tells the relay the session is over and releases the connection
    fn close(&mut self) -> Result<(), Self::Error>;
}

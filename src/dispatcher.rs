//! One delivery attempt: connect, secure, authenticate, send, close

use crate::{
    message::MessageEnvelope,
    result::{DispatchError, DispatchResult},
    transport::{smtp::SmtpConnector, Connector, Credentials, Session, TransportParameters},
};

/// Delivers messages through sessions opened by a [`Connector`]
///
/// Every call to [`dispatch`](Self::dispatch) is a separate attempt with its
/// own session; nothing is shared between calls.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher<C = SmtpConnector> {
    connector: C,
}

impl Dispatcher {
    /// Creates a dispatcher that talks SMTP with default settings
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Connector> Dispatcher<C> {
    /// Creates a dispatcher using `connector` to reach the relay
    pub fn with_connector(connector: C) -> Self {
        Self { connector }
    }

    /// The connector in use
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Makes one delivery attempt
    ///
    /// Never panics and never leaves a session open: every failure is
    /// reported in the returned [`DispatchResult`]. Calling it twice sends the
    /// message twice.
    pub fn dispatch(
        &self,
        message: &MessageEnvelope,
        parameters: &TransportParameters,
    ) -> DispatchResult {
        let result = self.try_dispatch(message, parameters);

        #[cfg(feature = "tracing")]
        match &result {
            Ok(()) => tracing::debug!("message delivered to {}", message.to()),
            Err(err) => tracing::debug!("delivery failed ({}): {}", err.kind(), err),
        }

        result.into()
    }

    fn try_dispatch(
        &self,
        message: &MessageEnvelope,
        parameters: &TransportParameters,
    ) -> Result<(), DispatchError> {
        // Nothing reaches the relay unless the message builds
        let message = message
            .to_message()
            .map_err(DispatchError::transmission)?;
        let formatted = message.formatted();

        let credentials = parameters.credentials_for_auth();
        if credentials.as_ref().is_some_and(Credentials::is_incomplete) {
            return Err(DispatchError::authentication("missing credentials"));
        }

        let session = self
            .connector
            .connect(parameters)
            .map_err(DispatchError::connection)?;
        let mut session = SessionGuard::new(session);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "connected to {}:{}, encrypted: {}",
            parameters.host(),
            parameters.port(),
            session.get().is_encrypted()
        );

        if parameters.use_encryption() && !session.get().is_encrypted() {
            return Err(DispatchError::connection(
                "encryption was requested but the connection is not encrypted",
            ));
        }

        if let Some(credentials) = &credentials {
            session
                .get_mut()
                .authenticate(credentials)
                .map_err(DispatchError::authentication)?;

            #[cfg(feature = "tracing")]
            tracing::debug!("authenticated as {}", credentials.username());
        }

        session
            .get_mut()
            .send(message.envelope(), &formatted)
            .map_err(DispatchError::transmission)?;

        // The relay already accepted the message
        if let Err(_err) = session.close() {
            #[cfg(feature = "tracing")]
            tracing::debug!("ignoring error while closing the session: {}", _err);
        }

        Ok(())
    }
}

/// Owns a session and closes it exactly once, either explicitly or on drop
struct SessionGuard<S: Session> {
    session: S,
    closed: bool,
}

impl<S: Session> SessionGuard<S> {
    fn new(session: S) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    fn get(&self) -> &S {
        &self.session
    }

    fn get_mut(&mut self) -> &mut S {
        &mut self.session
    }

    fn close(mut self) -> Result<(), S::Error> {
        self.closed = true;
        self.session.close()
    }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            if let Err(_err) = self.session.close() {
                #[cfg(feature = "tracing")]
                tracing::debug!("error while closing an abandoned session: {}", _err);
            }
        }
    }
}

//! The message handed to the relay
//!
//! A [`MessageEnvelope`] carries one sender, one recipient, a subject and a
//! plain text body, exactly as the caller gave them. It is turned into a
//! lettre [`Message`], which provides both the SMTP envelope and the RFC 5322
//! formatted message:
//!
//! ```
//! use courier::MessageEnvelope;
//!
//! let message = MessageEnvelope::new(
//!     ("Alice", "alice@example.com"),
//!     ("Bob", "bob@example.com"),
//!     "Hi",
//!     "Test",
//! );
//!
//! let envelope = message.envelope()?;
//! assert_eq!(envelope.to()[0].to_string(), "bob@example.com");
//! let formatted = String::from_utf8(message.formatted()?).unwrap();
//! assert!(formatted.contains("Subject: Hi\r\n"));
//! # Ok::<(), courier::message::MessageError>(())
//! ```

use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
};

use lettre::{
    address::{AddressError, Envelope},
    message::SinglePart,
    Message,
};

pub use self::mailbox::Mailbox;

mod mailbox;

/// One plain text message, from one sender to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    from: Mailbox,
    to: Mailbox,
    subject: String,
    body: String,
}

impl MessageEnvelope {
    /// Creates a message
    ///
    /// `from` and `to` are usually `(display name, address)` pairs. Subject
    /// and body may be empty.
    pub fn new<F, T, S, B>(from: F, to: T, subject: S, body: B) -> Self
    where
        F: Into<Mailbox>,
        T: Into<Mailbox>,
        S: Into<String>,
        B: Into<String>,
    {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// The sender
    pub fn from(&self) -> &Mailbox {
        &self.from
    }

    /// The recipient
    pub fn to(&self) -> &Mailbox {
        &self.to
    }

    /// The subject
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The body, as given
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Builds the message, stamped with the current time and a fresh
    /// `Message-ID`
    ///
    /// The body becomes a single `text/plain; charset=utf-8` part. Header
    /// text is encoded and folded as needed, and line breaks in the subject
    /// or display names become spaces. Fails when an address is not one
    /// lettre can put in an SMTP command.
    pub fn to_message(&self) -> Result<Message, MessageError> {
        let message = Message::builder()
            .from(self.from.to_header()?)
            .to(self.to.to_header()?)
            .subject(one_line(&self.subject))
            .message_id(None)
            .singlepart(SinglePart::plain(self.body.clone()))?;
        Ok(message)
    }

    /// The SMTP envelope: `MAIL FROM` the sender address, `RCPT TO` the
    /// recipient address
    pub fn envelope(&self) -> Result<Envelope, MessageError> {
        Ok(self.to_message()?.envelope().clone())
    }

    /// Get message content formatted for SMTP
    pub fn formatted(&self) -> Result<Vec<u8>, MessageError> {
        Ok(self.to_message()?.formatted())
    }
}

/// Why a [`MessageEnvelope`] could not be built into a message
#[derive(Debug)]
pub enum MessageError {
    /// The sender or recipient address is invalid
    Address(AddressError),
    /// The message could not be assembled
    Build(lettre::error::Error),
}

impl Display for MessageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(e) => write!(f, "invalid address: {e}"),
            Self::Build(e) => write!(f, "invalid message: {e}"),
        }
    }
}

impl StdError for MessageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Address(e) => Some(e),
            Self::Build(e) => Some(e),
        }
    }
}

impl From<AddressError> for MessageError {
    fn from(err: AddressError) -> Self {
        Self::Address(err)
    }
}

impl From<lettre::error::Error> for MessageError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Build(err)
    }
}

/// Replaces CR and LF with spaces
fn one_line(text: &str) -> String {
    text.replace(|c: char| c == '\r' || c == '\n', " ")
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{MessageEnvelope, MessageError};

    fn format(message: &MessageEnvelope) -> String {
        String::from_utf8(message.formatted().unwrap()).unwrap()
    }

    fn header<'a>(formatted: &'a str, name: &str) -> Option<&'a str> {
        formatted
            .split("\r\n\r\n")
            .next()?
            .split("\r\n")
            .find_map(|line| line.strip_prefix(name)?.strip_prefix(": "))
    }

    #[test]
    fn email_message() {
        let message = MessageEnvelope::new(("A", "a@x.com"), ("B", "b@y.com"), "Hi", "Test");

        let formatted = format(&message);

        assert_eq!(header(&formatted, "From"), Some("A <a@x.com>"));
        assert_eq!(header(&formatted, "To"), Some("B <b@y.com>"));
        assert_eq!(header(&formatted, "Subject"), Some("Hi"));
        assert_eq!(header(&formatted, "MIME-Version"), Some("1.0"));
        assert_eq!(
            header(&formatted, "Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert_eq!(header(&formatted, "Content-Transfer-Encoding"), Some("7bit"));
        assert!(header(&formatted, "Date").is_some());
        assert!(formatted.ends_with("\r\n\r\nTest\r\n"));
    }

    #[test]
    fn envelope_uses_addresses() {
        let message = MessageEnvelope::new(("A", "a@x.com"), ("B", "b@y.com"), "Hi", "Test");
        let envelope = message.envelope().unwrap();

        assert_eq!(
            envelope.from().map(ToString::to_string),
            Some("a@x.com".to_owned())
        );
        assert_eq!(envelope.to().len(), 1);
        assert_eq!(envelope.to()[0].to_string(), "b@y.com");
    }

    #[test]
    fn empty_subject_and_body() {
        let message = MessageEnvelope::new(("", "a@x.com"), ("", "b@y.com"), "", "");

        let formatted = format(&message);

        assert_eq!(header(&formatted, "From"), Some("a@x.com"));
        assert_eq!(header(&formatted, "To"), Some("b@y.com"));
        assert!(formatted.split("\r\n").any(|line| line == "Subject:" || line == "Subject: "));
    }

    #[test]
    fn subject_cannot_inject_headers() {
        let message = MessageEnvelope::new(
            ("A", "a@x.com"),
            ("B", "b@y.com"),
            "Hi\r\nBcc: victim@example.com",
            "Test",
        );

        let formatted = format(&message);

        assert!(!formatted.split("\r\n").any(|line| line.starts_with("Bcc:")));
        assert!(header(&formatted, "Subject").is_some_and(|subject| subject.starts_with("Hi ")));
    }

    #[test]
    fn long_subject_is_folded() {
        let subject = "lorem ipsum dolor ".repeat(100);
        let message = MessageEnvelope::new("a@x.com", "b@y.com", subject.trim_end(), "Test");

        let formatted = format(&message);

        assert!(formatted.len() > subject.len());
        assert!(formatted.split("\r\n").all(|line| line.len() <= 998));
        // continuation lines start with whitespace
        let headers = formatted.split("\r\n\r\n").next().unwrap();
        assert!(headers
            .split("\r\n")
            .filter(|line| line.starts_with(' ') || line.starts_with('\t'))
            .count()
            > 1);
    }

    #[test]
    fn non_ascii_headers_are_encoded() {
        let message = MessageEnvelope::new(
            ("Привет, мир!", "a@x.com"),
            ("B", "b@y.com"),
            "Привет, мир!",
            "Questo messaggio è corto",
        );

        let formatted = format(&message);

        assert!(formatted.is_ascii());
        assert!(header(&formatted, "Subject").is_some_and(|subject| subject.starts_with("=?utf-8?b?")));
        assert_eq!(
            header(&formatted, "Content-Transfer-Encoding"),
            Some("quoted-printable")
        );
        assert!(formatted.contains("Questo messaggio =C3=A8 corto"));
    }

    #[test]
    fn formatted_has_fresh_message_id() {
        let message = MessageEnvelope::new("a@x.com", "b@y.com", "Hi", "Test");

        let first = format(&message);
        let second = format(&message);

        assert!(header(&first, "Message-ID").is_some());
        assert_ne!(header(&first, "Message-ID"), header(&second, "Message-ID"));
    }

    #[test]
    fn smuggled_recipient_is_refused() {
        let message = MessageEnvelope::new(
            "a@x.com",
            "b@y.com>\r\nRCPT TO:<evil@z.com",
            "Hi",
            "Test",
        );

        assert!(matches!(message.to_message(), Err(MessageError::Address(_))));
        assert!(message
            .formatted()
            .unwrap_err()
            .to_string()
            .starts_with("invalid address"));
    }
}

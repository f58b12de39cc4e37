use std::fmt::{Display, Formatter, Result as FmtResult};

use lettre::{address::AddressError, message::Mailbox as HeaderMailbox, Address};

/// An email address with an optional display name, as given by the caller
///
/// Nothing is checked until the message is built, see
/// [`MessageEnvelope::to_message`](super::MessageEnvelope::to_message).
///
/// ```
/// # use courier::message::Mailbox;
/// let mailbox = Mailbox::from(("John Smith", "example@email.com"));
/// assert_eq!(mailbox.to_string(), "John Smith <example@email.com>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mailbox {
    /// The name associated with the address.
    pub name: Option<String>,

    /// The email address itself.
    pub email: String,
}

impl Mailbox {
    /// Creates a new `Mailbox` using an email address and the name of the recipient if there is one.
    pub fn new(name: Option<String>, email: String) -> Self {
        Mailbox { name, email }
    }

    /// The display name to put in headers, `None` when blank
    fn display_name(&self) -> Option<String> {
        let name = super::one_line(self.name.as_deref()?);
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_owned())
    }

    /// Parses the address, failing on anything that cannot travel in an
    /// SMTP command, line breaks included
    pub(crate) fn to_header(&self) -> Result<HeaderMailbox, AddressError> {
        let email = self.email.parse::<Address>()?;
        Ok(HeaderMailbox::new(self.display_name(), email))
    }
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.display_name() {
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => f.write_str(&self.email),
        }
    }
}

impl<S: Into<String>, T: Into<String>> From<(S, T)> for Mailbox {
    fn from((name, address): (S, T)) -> Self {
        Mailbox::new(Some(name.into()), address.into())
    }
}

impl From<String> for Mailbox {
    fn from(address: String) -> Self {
        Self::new(None, address)
    }
}

impl From<&str> for Mailbox {
    fn from(address: &str) -> Self {
        Self::new(None, address.to_owned())
    }
}

//! Courier hands one plain text message to a mail relay, and tells you
//! whether it worked.
//!
//! A delivery attempt connects to the relay, secures the connection when
//! asked to, presents credentials when asked to, sends the message and
//! closes the connection, whatever happened along the way. Failures are
//! reported in the returned [`DispatchResult`], never as a panic.
//!
//! Messages are built and spoken over the wire by [`lettre`]; courier
//! decides what happens in which order and what a failure means.
//!
//! ```rust,no_run
//! use courier::{MessageEnvelope, TransportParameters};
//!
//! let message = MessageEnvelope::new(
//!     ("Alice", "alice@example.com"),
//!     ("Bob", "bob@example.com"),
//!     "Hi",
//!     "Test",
//! );
//! let transport = TransportParameters::new("smtp.example.com", 587)
//!     .encryption(true)
//!     .authentication(true)
//!     .credentials("alice", "secret");
//!
//! let result = courier::dispatch(&message, &transport);
//! if result.succeeded() {
//!     println!("sent");
//! } else {
//!     eprintln!("not sent: {}", result.error_message());
//! }
//! ```
//!
//! ## Features
//!
//! * **native-tls** (default): TLS through the system library, required to
//!   use encryption
//! * **hostname** (default): use the machine hostname in `EHLO` and in
//!   `Message-ID`
//! * **tracing**: log protocol exchanges with `tracing`
//! * **serde**: `Serialize` and `Deserialize` for mailboxes and the security
//!   mode

#![doc(html_root_url = "https://docs.rs/crate/courier/0.1.0")]
#![forbid(unsafe_code)]
#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications,
    missing_debug_implementations,
    missing_docs,
    clippy::explicit_iter_loop,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::string_add,
    rustdoc::broken_intra_doc_links
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod dispatcher;
pub mod message;
pub mod result;
pub mod transport;

use std::error::Error as StdError;

pub use lettre::{address::Envelope, Address};

pub use crate::{
    dispatcher::Dispatcher,
    message::{Mailbox, MessageEnvelope},
    result::{DispatchError, DispatchResult, FailureKind},
    transport::{Security, TransportParameters},
};

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Makes one delivery attempt over SMTP, with default settings
///
/// See [`Dispatcher::dispatch`].
pub fn dispatch(message: &MessageEnvelope, parameters: &TransportParameters) -> DispatchResult {
    Dispatcher::new().dispatch(message, parameters)
}

//! Missive is an email library for composing MIME messages and handing them over for
//! delivery. It provides:
//!
//! * A mutable message model with address, header, body and attachment management
//! * Automatic MIME structure (alternative, related, mixed) and PGP/MIME wrapping
//! * RFC 2047 encoded words, quoted-printable and base64 content encodings
//! * Middlewares and pluggable template engines
//! * Pluggable email transports which record the delivery outcome on the message
//!
//! ## Optional features
//!
//! * **builder**: Message model and MIME serializer
//! * **file-transport**: Transport that write messages into a file
//! * **file-transport-envelope**: Store the envelope next to the message in the file transport
//! * **sendmail-transport**: Transport through the local sendmail command
//! * **tracing**: Logging using the `tracing` crate
//! * **serde**: Serialization/Deserialization of entities and message options
//! * **hostname**: Ability to try to use actual hostname in generated Message-IDs

#![doc(html_root_url = "https://docs.rs/missive/0.1.0")]
#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces,
    unsafe_code
)]

pub use crate::address::{Address, AddressError, Envelope};
pub use crate::error::Error;
#[cfg(feature = "builder")]
pub use crate::message::{Mailbox, Mailboxes, Message};
#[cfg(feature = "file-transport")]
pub use crate::transport::file::FileTransport;
#[cfg(feature = "sendmail-transport")]
pub use crate::transport::sendmail::SendmailTransport;
pub use crate::transport::Transport;

mod address;
mod error;
#[cfg(feature = "builder")]
pub mod message;
pub mod transport;

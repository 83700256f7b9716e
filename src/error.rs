//! Error type for email messages

use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
    io,
    path::PathBuf,
    sync::Arc,
};

use crate::address::AddressError;
use crate::transport::SendError;

/// Error type for email content
#[derive(Debug)]
pub enum Error {
    /// A candidate could not be parsed as a mailbox
    InvalidAddress {
        candidate: String,
        source: AddressError,
    },
    /// Header field names must be printable ASCII without a colon
    InvalidHeaderName(String),
    /// Neither `Envelope-From` nor `From` is set
    NoFromAddress,
    /// `To`, `Cc` and `Bcc` are all empty
    NoRecipient,
    /// The template engine does not know the requested template
    TemplateMissing {
        operation: &'static str,
        name: String,
    },
    /// The template engine failed to render
    Template {
        operation: &'static str,
        source: Box<dyn StdError + Send + Sync>,
    },
    /// A part or attachment failed to produce its content
    Content(io::Error),
    /// The output sink failed
    Write(io::Error),
    /// A file could not be opened or created
    File { path: PathBuf, source: io::Error },
    /// Delivery failed before the message reached the transport
    Send(SendError),
    /// The transport rejected the message
    Transport(Arc<dyn StdError + Send + Sync>),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidAddress { candidate, source } => {
                write!(f, "failed to parse mail address \"{}\": {}", candidate, source)
            }
            Error::InvalidHeaderName(name) => write!(f, "invalid header name: {:?}", name),
            Error::NoFromAddress => f.write_str("no FROM address set"),
            Error::NoRecipient => f.write_str("no recipient addresses set"),
            Error::TemplateMissing { operation, name } => {
                write!(f, "{}: template {:?} is not registered", operation, name)
            }
            Error::Template { operation, source } => {
                write!(f, "{}: failed to execute template: {}", operation, source)
            }
            Error::Content(e) => write!(f, "failed to produce content: {}", e),
            Error::Write(e) => write!(f, "failed to write message: {}", e),
            Error::File { path, source } => write!(f, "{}: {}", path.display(), source),
            Error::Send(e) => Display::fmt(e, f),
            Error::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::InvalidAddress { source, .. } => Some(source),
            Error::Template { source, .. } => Some(&**source),
            Error::Content(e) | Error::Write(e) => Some(e),
            Error::File { source, .. } => Some(source),
            Error::Send(e) => Some(e),
            Error::Transport(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<SendError> for Error {
    fn from(err: SendError) -> Error {
        Error::Send(err)
    }
}

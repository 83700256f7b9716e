//! ### Sending Messages
//!
//! This section explains how to hand messages over for delivery.
//!
//! A transport receives the serialized message together with its envelope. The provided
//! [`Transport::send`] resolves the envelope from the message, serializes it and records the
//! outcome on the message, so that [`Message::is_delivered`] and
//! [`Message::send_error_is_temporary`] tell what happened.
//!
//! The following transports are available:
//!
//! * The `SendmailTransport` uses the sendmail command to send messages.
//! * The `FileTransport` creates a file containing the email content to be sent. It can be used
//!   for debugging or if you want to keep all sent emails.
//! * The `StubTransport` is useful for debugging and testing, it keeps the messages it is
//!   given and answers with a preconfigured result.
//!
//! [`Message::is_delivered`]: crate::Message::is_delivered
//! [`Message::send_error_is_temporary`]: crate::Message::send_error_is_temporary

use std::{error::Error as StdError, fmt};
#[cfg(feature = "builder")]
use std::sync::Arc;

use crate::address::Envelope;
#[cfg(feature = "builder")]
use crate::{Error, Message};

pub use self::error::{Reason, SendError};

mod error;
#[cfg(feature = "file-transport")]
pub mod file;
#[cfg(feature = "sendmail-transport")]
pub mod sendmail;
pub mod stub;

/// Blocking Transport method for emails
pub trait Transport {
    /// Result types for the transport
    type Ok: fmt::Debug;
    type Error: StdError + Send + Sync + 'static;

    /// Sends the email and records the outcome on it
    ///
    /// Failing to resolve the envelope or to serialize the message is reported as a
    /// [`SendError`], errors of the transport itself as [`Error::Transport`].
    #[cfg(feature = "builder")]
    fn send(&self, message: &mut Message) -> Result<Self::Ok, Error> {
        let envelope = match message.envelope() {
            Ok(envelope) => envelope,
            Err(err) => {
                let reason = match err {
                    Error::NoFromAddress => Reason::GetSender,
                    _ => Reason::GetRecipients,
                };
                return Err(record_failure(message, SendError::new(reason).with_source(err)));
            }
        };

        let raw = match message.formatted() {
            Ok(raw) => raw,
            Err(err) => {
                let err = SendError::new(Reason::WriteContent).with_source(err);
                return Err(record_failure(message, err));
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            message_id = message.message_id(),
            recipients = envelope.to().len(),
            "sending message"
        );

        match self.send_raw(&envelope, &raw) {
            Ok(ok) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(message_id = message.message_id(), "message delivered");
                message.set_delivered();
                Ok(ok)
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    message_id = message.message_id(),
                    error = %err,
                    "delivery failed"
                );
                let err: Arc<dyn StdError + Send + Sync> = Arc::new(err);
                message.set_shared_send_error(Arc::clone(&err));
                Err(Error::Transport(err))
            }
        }
    }

    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error>;
}

#[cfg(feature = "builder")]
fn record_failure(message: &mut Message, err: SendError) -> Error {
    #[cfg(feature = "tracing")]
    tracing::warn!(error = %err, "message not sent");
    message.set_send_error(err.clone());
    Error::Send(err)
}

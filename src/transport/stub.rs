//! The stub transport only records what it is given and answers with a configured result.
//! It can be useful for testing purposes.
//!
//! #### Stub Transport
//!
//! ```rust
//! # #[cfg(feature = "builder")]
//! # {
//! use missive::{transport::stub::StubTransport, Message, Transport};
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let mut email = Message::new();
//! email.set_from("NoBody <nobody@domain.tld>")?;
//! email.set_to(&["Hei <hei@domain.tld>"])?;
//! email.set_subject("Happy new year");
//! email.set_body_string(mime::TEXT_PLAIN, "Be happy!");
//!
//! let sender = StubTransport::new_ok();
//! let result = sender.send(&mut email);
//! assert!(result.is_ok());
//! assert!(email.is_delivered());
//! assert_eq!(sender.messages().len(), 1);
//! # Ok(())
//! # }
//! # }
//! ```

use std::sync::{Arc, Mutex};

use crate::{
    address::Envelope,
    transport::{SendError, Transport},
};

/// This transport keeps the messages it sends and returns a configured result
#[derive(Debug, Clone)]
pub struct StubTransport {
    response: Result<(), SendError>,
    messages: Arc<Mutex<Vec<(Envelope, Vec<u8>)>>>,
}

impl StubTransport {
    /// Creates a new transport that always returns the given response
    pub fn new(response: Result<(), SendError>) -> StubTransport {
        StubTransport {
            response,
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a new transport that always returns a success response
    pub fn new_ok() -> StubTransport {
        StubTransport::new(Ok(()))
    }

    /// Creates a new transport that always fails with `error`
    pub fn new_error(error: SendError) -> StubTransport {
        StubTransport::new(Err(error))
    }

    /// Envelopes and contents of the messages received so far, in order
    pub fn messages(&self) -> Vec<(Envelope, Vec<u8>)> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Transport for StubTransport {
    type Ok = ();
    type Error = SendError;

    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error> {
        let mut messages = match self.messages.lock() {
            Ok(messages) => messages,
            Err(poisoned) => poisoned.into_inner(),
        };
        messages.push((envelope.clone(), email.to_vec()));
        self.response.clone()
    }
}

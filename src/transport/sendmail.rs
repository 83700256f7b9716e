//! The sendmail transport sends the email using the local sendmail command.
//!
//! #### Sendmail Transport
//!
//! ```rust,no_run
//! # #[cfg(feature = "builder")]
//! # {
//! use missive::{Message, SendmailTransport, Transport};
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let mut email = Message::new();
//! email.set_from("NoBody <nobody@domain.tld>")?;
//! email.set_to(&["Hei <hei@domain.tld>"])?;
//! email.set_subject("Happy new year");
//! email.set_body_string(mime::TEXT_PLAIN, "Be happy!");
//!
//! let sender = SendmailTransport::new();
//! let result = sender.send(&mut email);
//! assert!(result.is_ok());
//! # Ok(())
//! # }
//! # }
//! ```

use std::{
    ffi::OsString,
    io::{self, Write},
    process::{Command, Output, Stdio},
};

use crate::{
    address::Envelope,
    transport::{Reason, SendError, Transport},
};

const DEFAULT_SENDMAIL: &str = "/usr/sbin/sendmail";

/// `EX_TEMPFAIL` from `sysexits.h`, sendmail uses it for failures worth retrying
const EX_TEMPFAIL: i32 = 75;

/// Sends an email using the `sendmail` command
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SendmailTransport {
    command: OsString,
}

impl SendmailTransport {
    /// Creates a new transport with the default `/usr/sbin/sendmail` command
    pub fn new() -> SendmailTransport {
        SendmailTransport {
            command: DEFAULT_SENDMAIL.into(),
        }
    }

    /// Creates a new transport to the given sendmail command
    pub fn new_with_command<S: Into<OsString>>(command: S) -> SendmailTransport {
        SendmailTransport {
            command: command.into(),
        }
    }

    fn command(&self, envelope: &Envelope) -> Command {
        let mut c = Command::new(&self.command);
        c.arg("-i");
        if let Some(from) = envelope.from() {
            c.arg("-f").arg(from);
        }
        c.arg("--")
            .args(envelope.to())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        c
    }
}

impl Default for SendmailTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SendmailTransport {
    type Ok = ();
    type Error = SendError;

    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error> {
        #[cfg(feature = "tracing")]
        tracing::debug!(command = ?self.command, "spawning sendmail");

        let mut process = self
            .command(envelope)
            .spawn()
            .map_err(|e| SendError::new(Reason::Connect).with_source(e))?;

        // sendmail may exit before reading all of stdin, its exit status is still collected
        let written = match process.stdin.take() {
            Some(mut stdin) => stdin.write_all(email),
            None => Ok(()),
        };

        let output = process
            .wait_with_output()
            .map_err(|e| SendError::new(Reason::DataClose).with_source(e))?;

        outcome(envelope, written, &output)
    }
}

/// Classifies a finished sendmail run, a failed exit status wins over a write error
fn outcome(envelope: &Envelope, written: io::Result<()>, output: &Output) -> Result<(), SendError> {
    if !output.status.success() {
        let detail = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        let detail = if detail.is_empty() {
            output.status.to_string()
        } else {
            detail
        };
        return Err(exit_error(envelope, output.status.code(), detail));
    }

    written.map_err(|e| SendError::new(Reason::WriteContent).with_source(e))
}

/// Failure of a sendmail run that exited with `code`
fn exit_error(envelope: &Envelope, code: Option<i32>, detail: String) -> SendError {
    SendError::new(Reason::Data)
        .with_temporary(code == Some(EX_TEMPFAIL))
        .with_detail(detail)
        .with_recipients(envelope.to().iter().map(ToString::to_string))
}

//! The file transport writes the emails to the given directory. The name of the file will be
//! `email_id.eml`, with `email_id` being a random UUID returned by the transport.
//! It can be useful for testing purposes, or if you want to keep track of sent messages.
//!
//! #### File Transport
//!
//! ```rust
//! # #[cfg(feature = "builder")]
//! # {
//! use std::env::temp_dir;
//! use missive::{FileTransport, Message, Transport};
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! // Write to the local temp directory
//! let sender = FileTransport::new(temp_dir());
//! let mut email = Message::new();
//! email.set_from("NoBody <nobody@domain.tld>")?;
//! email.set_to(&["Hei <hei@domain.tld>"])?;
//! email.set_subject("Happy new year");
//! email.set_body_string(mime::TEXT_PLAIN, "Be happy!");
//!
//! let email_id = sender.send(&mut email)?;
//! # std::fs::remove_file(temp_dir().join(format!("{}.eml", email_id)))?;
//! # Ok(())
//! # }
//! # }
//! ```
//!
//! With the `file-transport-envelope` feature the envelope is stored next to the message in
//! `email_id.json` and both can be read back with [`FileTransport::read`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use uuid::Uuid;

use crate::{
    address::Envelope,
    transport::{Reason, SendError, Transport},
};

/// Writes the content and the envelope information to a file
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileTransport {
    path: PathBuf,
    #[cfg(feature = "file-transport-envelope")]
    #[cfg_attr(feature = "serde", serde(default))]
    save_envelope: bool,
}

impl FileTransport {
    /// Creates a new transport to the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> FileTransport {
        FileTransport {
            path: PathBuf::from(path.as_ref()),
            #[cfg(feature = "file-transport-envelope")]
            save_envelope: false,
        }
    }

    /// Creates a new transport to the given directory that also stores the envelopes
    #[cfg(feature = "file-transport-envelope")]
    pub fn with_envelope<P: AsRef<Path>>(path: P) -> FileTransport {
        FileTransport {
            path: PathBuf::from(path.as_ref()),
            save_envelope: true,
        }
    }

    /// Reads back a message written by this transport, along with its envelope
    #[cfg(feature = "file-transport-envelope")]
    pub fn read(&self, email_id: &str) -> Result<(Envelope, Vec<u8>), SendError> {
        let eml_file = self.path.join(format!("{}.eml", email_id));
        let eml = fs::read(eml_file).map_err(file_error)?;

        let json_file = self.path.join(format!("{}.json", email_id));
        let json = fs::read(json_file).map_err(file_error)?;
        let envelope = serde_json::from_slice(&json).map_err(file_error)?;

        Ok((envelope, eml))
    }

    fn path(&self, email_id: &Uuid, extension: &str) -> PathBuf {
        self.path.join(format!("{}.{}", email_id, extension))
    }
}

fn file_error<E>(err: E) -> SendError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SendError::new(Reason::WriteContent).with_source(err)
}

impl Transport for FileTransport {
    type Ok = String;
    type Error = SendError;

    fn send_raw(&self, envelope: &Envelope, email: &[u8]) -> Result<Self::Ok, Self::Error> {
        let email_id = Uuid::new_v4();

        let file = self.path(&email_id, "eml");
        #[cfg(feature = "tracing")]
        tracing::debug!(file = %file.display(), "writing email");
        fs::write(file, email).map_err(file_error)?;

        #[cfg(feature = "file-transport-envelope")]
        {
            if self.save_envelope {
                let file = self.path(&email_id, "json");
                let buf = serde_json::to_string(&envelope).map_err(file_error)?;
                fs::write(file, buf).map_err(file_error)?;
            }
        }
        // the envelope is only stored with file-transport-envelope
        #[cfg(not(feature = "file-transport-envelope"))]
        let _ = envelope;

        Ok(email_id.to_string())
    }
}

//! Delivery failures

use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

/// Stage of the delivery in which a [`SendError`] happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The envelope sender could not be resolved
    GetSender,
    /// The envelope recipients could not be resolved
    GetRecipients,
    /// The message could not be serialized or handed over
    WriteContent,
    /// The transport could not be reached or started
    Connect,
    /// The sender was refused
    MailFrom,
    /// One or more recipients were refused
    RcptTo,
    /// The message data was refused
    Data,
    /// Closing the message data failed
    DataClose,
    /// Resetting the transport state failed
    Reset,
    /// The transport failed its liveness check
    ConnectionCheck,
    /// Several messages failed for different reasons
    Ambiguous,
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Reason::GetSender => "getting sender address",
            Reason::GetRecipients => "getting recipient addresses",
            Reason::WriteContent => "sending message content",
            Reason::Connect => "connecting to the transport",
            Reason::MailFrom => "sending MAIL FROM command",
            Reason::RcptTo => "sending RCPT TO command",
            Reason::Data => "sending DATA command",
            Reason::DataClose => "closing DATA writer",
            Reason::Reset => "sending RSET command",
            Reason::ConnectionCheck => "checking transport connection",
            Reason::Ambiguous => "ambiguous reason, check each message for its own error",
        })
    }
}

/// Error returned by a transport when a message could not be delivered
///
/// The error is either temporary, in which case the delivery may be retried later, or
/// permanent. Reply codes follow the SMTP convention, `4xx` are temporary and everything
/// else is permanent.
#[derive(Debug, Clone)]
pub struct SendError {
    reason: Reason,
    temporary: bool,
    code: Option<u16>,
    detail: Option<String>,
    recipients: Vec<String>,
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl SendError {
    /// Creates a permanent error for the given stage
    pub fn new(reason: Reason) -> Self {
        SendError {
            reason,
            temporary: false,
            code: None,
            detail: None,
            recipients: Vec::new(),
            source: None,
        }
    }

    /// Creates an error classified from a SMTP style reply code
    ///
    /// ```
    /// use missive::transport::{Reason, SendError};
    ///
    /// assert!(SendError::from_reply_code(Reason::RcptTo, 451, "try again later").is_temporary());
    /// assert!(!SendError::from_reply_code(Reason::RcptTo, 550, "no such user").is_temporary());
    /// ```
    pub fn from_reply_code<S: Into<String>>(reason: Reason, code: u16, detail: S) -> Self {
        SendError {
            temporary: (400..500).contains(&code),
            code: Some(code),
            detail: Some(detail.into()),
            ..SendError::new(reason)
        }
    }

    pub fn with_temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    pub fn with_detail<S: Into<String>>(mut self, detail: S) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_recipients<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipients = recipients.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// Whether retrying the delivery later may succeed
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn code(&self) -> Option<u16> {
        self.code
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Recipients affected by this error
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }
}

impl Display for SendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.reason, f)?;
        if let Some(code) = self.code {
            write!(f, ": {}", code)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        } else if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        if !self.recipients.is_empty() {
            write!(f, " (affected recipients: {})", self.recipients.join(", "))?;
        }
        Ok(())
    }
}

impl StdError for SendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.source {
            Some(source) => Some(&**source),
            None => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Reason, SendError};
    use std::io;

    #[test]
    fn reply_code_classification() {
        assert!(SendError::from_reply_code(Reason::Data, 421, "busy").is_temporary());
        assert!(SendError::from_reply_code(Reason::Data, 499, "busy").is_temporary());
        assert!(!SendError::from_reply_code(Reason::Data, 500, "nope").is_temporary());
        assert!(!SendError::from_reply_code(Reason::Data, 250, "odd").is_temporary());
    }

    #[test]
    fn display() {
        let err = SendError::from_reply_code(Reason::RcptTo, 550, "mailbox unavailable")
            .with_recipients(vec!["a@domain.tld", "b@domain.tld"]);
        assert_eq!(
            err.to_string(),
            "sending RCPT TO command: 550: mailbox unavailable (affected recipients: a@domain.tld, b@domain.tld)"
        );

        let err = SendError::new(Reason::WriteContent)
            .with_source(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        assert_eq!(err.to_string(), "sending message content: pipe closed");
    }
}

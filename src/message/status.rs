use std::{error::Error as StdError, sync::Arc};

use crate::transport::SendError;

/// Outcome of the last delivery attempt of a message
#[derive(Debug, Clone, Default)]
pub(crate) struct DeliveryStatus {
    delivered: bool,
    error: Option<Arc<dyn StdError + Send + Sync>>,
}

impl DeliveryStatus {
    pub(crate) fn set_delivered(&mut self) {
        self.delivered = true;
        self.error = None;
    }

    pub(crate) fn set_error(&mut self, error: Arc<dyn StdError + Send + Sync>) {
        self.delivered = false;
        self.error = Some(error);
    }

    pub(crate) fn is_delivered(&self) -> bool {
        self.delivered
    }

    pub(crate) fn error(&self) -> Option<&Arc<dyn StdError + Send + Sync>> {
        self.error.as_ref()
    }

    /// Only a [`SendError`] somewhere in the source chain can mark the error as temporary
    pub(crate) fn is_temporary(&self) -> bool {
        let mut current: Option<&(dyn StdError + 'static)> = match &self.error {
            Some(error) => Some(&**error),
            None => return false,
        };
        while let Some(error) = current {
            if let Some(send_error) = error.downcast_ref::<SendError>() {
                return send_error.is_temporary();
            }
            current = error.source();
        }
        false
    }
}

#[cfg(test)]
mod test {
    use super::DeliveryStatus;
    use crate::transport::{Reason, SendError};
    use crate::Error;
    use std::{io, sync::Arc};

    #[test]
    fn default_is_pending() {
        let status = DeliveryStatus::default();
        assert!(!status.is_delivered());
        assert!(status.error().is_none());
        assert!(!status.is_temporary());
    }

    #[test]
    fn temporary_send_error() {
        let mut status = DeliveryStatus::default();
        status.set_error(Arc::new(SendError::from_reply_code(
            Reason::RcptTo,
            451,
            "try again later",
        )));
        assert!(!status.is_delivered());
        assert!(status.is_temporary());

        status.set_delivered();
        assert!(status.is_delivered());
        assert!(status.error().is_none());
    }

    #[test]
    fn wrapped_send_error() {
        let mut status = DeliveryStatus::default();
        let inner = SendError::new(Reason::Connect).with_temporary(true);
        status.set_error(Arc::new(Error::Send(inner)));
        assert!(status.is_temporary());
    }

    #[test]
    fn unknown_error_is_permanent() {
        let mut status = DeliveryStatus::default();
        status.set_error(Arc::new(io::Error::new(io::ErrorKind::Other, "boom")));
        assert!(status.error().is_some());
        assert!(!status.is_temporary());
    }
}

use std::fmt;

use crate::message::Message;

/// A transformation applied to a message right before it is serialized
///
/// Middlewares run in the order they were registered. [`Message::write_to`] hands them a
/// copy of the message, so the stored message keeps its original content.
///
/// ```
/// use missive::message::{Message, Middleware};
///
/// struct Tag;
///
/// impl Middleware for Tag {
///     fn handle(&self, message: &mut Message) {
///         let subject = format!("[tagged] {}", message.subject());
///         message.set_subject(subject);
///     }
///
///     fn kind(&self) -> &str {
///         "tag"
///     }
/// }
///
/// let mut message = Message::builder().middleware(Tag).build();
/// message.set_subject("Hello");
/// message.apply_middlewares();
/// assert_eq!(message.subject(), "[tagged] Hello");
/// ```
pub trait Middleware: Send + Sync {
    fn handle(&self, message: &mut Message);

    /// Name used to skip the middleware with [`Message::write_to_skip_middleware`]
    fn kind(&self) -> &str;
}

impl fmt::Debug for dyn Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Middleware({})", self.kind())
    }
}

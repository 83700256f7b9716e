use super::{Charset, HeaderName};
use crate::message::mailbox::Mailbox;

/// Kinds of address headers a message carries
///
/// The declaration order is the order in which the headers are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressKind {
    /// `From`, holds a single mailbox
    From,
    /// SMTP envelope sender, holds a single mailbox and is never written as a header
    EnvelopeFrom,
    /// `Reply-To`
    ReplyTo,
    /// `To`
    To,
    /// `Cc`
    Cc,
    /// `Bcc`, only used for the envelope and never written as a header
    Bcc,
    /// `Disposition-Notification-To`, requests a message disposition notification
    DispositionNotificationTo,
}

impl AddressKind {
    pub const ALL: [AddressKind; 7] = [
        AddressKind::From,
        AddressKind::EnvelopeFrom,
        AddressKind::ReplyTo,
        AddressKind::To,
        AddressKind::Cc,
        AddressKind::Bcc,
        AddressKind::DispositionNotificationTo,
    ];

    pub fn header_name(self) -> HeaderName {
        HeaderName::from_static(match self {
            AddressKind::From => "From",
            AddressKind::EnvelopeFrom => "EnvelopeFrom",
            AddressKind::ReplyTo => "Reply-To",
            AddressKind::To => "To",
            AddressKind::Cc => "Cc",
            AddressKind::Bcc => "Bcc",
            AddressKind::DispositionNotificationTo => "Disposition-Notification-To",
        })
    }

    /// Whether only the first mailbox is kept
    pub fn is_single(self) -> bool {
        match self {
            AddressKind::From | AddressKind::EnvelopeFrom => true,
            _ => false,
        }
    }

    /// Whether the kind shows up in the header block
    pub fn is_written(self) -> bool {
        match self {
            AddressKind::EnvelopeFrom | AddressKind::Bcc => false,
            _ => true,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Mailboxes of every [`AddressKind`], all present from the start
#[derive(Debug, Clone, Default)]
pub(crate) struct AddressHeaders {
    entries: [Vec<Mailbox>; 7],
}

impl AddressHeaders {
    pub(crate) fn get(&self, kind: AddressKind) -> &[Mailbox] {
        &self.entries[kind.index()]
    }

    pub(crate) fn set(&mut self, kind: AddressKind, mut mailboxes: Vec<Mailbox>) {
        if kind.is_single() {
            mailboxes.truncate(1);
        }
        self.entries[kind.index()] = mailboxes;
    }

    pub(crate) fn push(&mut self, kind: AddressKind, mailbox: Mailbox) {
        let entries = &mut self.entries[kind.index()];
        if kind.is_single() && !entries.is_empty() {
            return;
        }
        entries.push(mailbox);
    }

    pub(crate) fn clear(&mut self) {
        for entries in self.entries.iter_mut() {
            entries.clear();
        }
    }
}

/// Renders mailboxes as a header value, encoding non-ASCII display names
pub(crate) fn format_mailboxes(mailboxes: &[Mailbox], charset: &Charset) -> String {
    mailboxes
        .iter()
        .map(|mailbox| mailbox.encode(charset))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod test {
    use super::{format_mailboxes, AddressHeaders, AddressKind};
    use crate::message::header::Charset;
    use crate::message::mailbox::Mailbox;

    fn mailbox(s: &str) -> Mailbox {
        s.parse().unwrap()
    }

    #[test]
    fn format_single_without_name() {
        let value = format_mailboxes(&[mailbox("kayo@example.com")], &Charset::UTF_8);
        assert_eq!(value, "<kayo@example.com>");
    }

    #[test]
    fn format_multi_with_name() {
        let value = format_mailboxes(
            &[
                mailbox("K. <kayo@example.com>"),
                mailbox("Pony P. <pony@domain.tld>"),
            ],
            &Charset::UTF_8,
        );
        assert_eq!(
            value,
            r#""K." <kayo@example.com>, "Pony P." <pony@domain.tld>"#
        );
    }

    #[test]
    fn format_single_with_utf8_name() {
        let value = format_mailboxes(&[mailbox("Кайо <kayo@example.com>")], &Charset::UTF_8);
        assert_eq!(value, "=?UTF-8?q?=D0=9A=D0=B0=D0=B9=D0=BE?= <kayo@example.com>");
    }

    #[test]
    fn single_kinds_keep_first() {
        let mut headers = AddressHeaders::default();
        headers.set(
            AddressKind::From,
            vec![mailbox("a@domain.tld"), mailbox("b@domain.tld")],
        );
        headers.push(AddressKind::From, mailbox("c@domain.tld"));
        assert_eq!(headers.get(AddressKind::From), &[mailbox("a@domain.tld")][..]);

        headers.set(
            AddressKind::To,
            vec![mailbox("a@domain.tld"), mailbox("b@domain.tld")],
        );
        headers.push(AddressKind::To, mailbox("c@domain.tld"));
        assert_eq!(headers.get(AddressKind::To).len(), 3);

        headers.clear();
        assert!(AddressKind::ALL.iter().all(|kind| headers.get(*kind).is_empty()));
    }
}

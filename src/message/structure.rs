use std::{borrow::Cow, sync::Arc};

use mime::Mime;
use once_cell::sync::Lazy;

use crate::message::{
    attachment::Attachment,
    body::Part,
    header::{ContentTransferEncoding, PgpType},
    Message,
};

static PGP_SIGNATURE: Lazy<Mime> = Lazy::new(|| {
    "application/pgp-signature"
        .parse()
        .expect("application/pgp-signature is a valid MIME type")
});
static PGP_ENCRYPTED: Lazy<Mime> = Lazy::new(|| {
    "application/pgp-encrypted"
        .parse()
        .expect("application/pgp-encrypted is a valid MIME type")
});

/// Kind of a multipart container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MultipartKind {
    Alternative,
    Related,
    Mixed,
    Signed,
    Encrypted,
}

impl MultipartKind {
    pub(crate) fn content_type(self, boundary: &str) -> String {
        match self {
            MultipartKind::Alternative => format!("multipart/alternative; boundary=\"{}\"", boundary),
            MultipartKind::Related => format!("multipart/related; boundary=\"{}\"", boundary),
            MultipartKind::Mixed => format!("multipart/mixed; boundary=\"{}\"", boundary),
            MultipartKind::Signed => format!(
                "multipart/signed; protocol=\"application/pgp-signature\"; micalg=pgp-sha256; boundary=\"{}\"",
                boundary
            ),
            MultipartKind::Encrypted => format!(
                "multipart/encrypted; protocol=\"application/pgp-encrypted\"; boundary=\"{}\"",
                boundary
            ),
        }
    }
}

/// Entity tree of a message body
#[derive(Debug)]
pub(crate) enum Node<'a> {
    Part(Cow<'a, Part>),
    File(&'a Attachment),
    Multipart {
        kind: MultipartKind,
        boundary: String,
        children: Vec<Node<'a>>,
    },
}

impl<'a> Node<'a> {
    /// Builds the tree for the current content of `message`
    ///
    /// The outermost container uses the message boundary, nested ones a numbered variant
    /// of it, in document order.
    pub(crate) fn of(message: &'a Message) -> Node<'a> {
        let parts: Vec<&Part> = message.parts.iter().filter(|p| !p.is_deleted()).collect();

        let root = match message.pgp_type {
            PgpType::None => content(parts, &message.embeds, &message.attachments),
            PgpType::Signature => {
                let (signatures, body): (Vec<&Part>, Vec<&Part>) =
                    parts.into_iter().partition(|p| p.is_type(&PGP_SIGNATURE));
                let body = content(body, &message.embeds, &message.attachments)
                    .unwrap_or_else(|| empty_body(message));
                let mut children = vec![body];
                children.extend(signatures.into_iter().map(borrowed));
                container(MultipartKind::Signed, children)
            }
            PgpType::Encrypted => {
                #[cfg(feature = "tracing")]
                {
                    let files = message.embeds.len() + message.attachments.len();
                    if files > 0 {
                        tracing::warn!(files, "encrypted messages do not carry files, skipping");
                    }
                }

                let (control, payload): (Vec<&Part>, Vec<&Part>) =
                    parts.into_iter().partition(|p| p.is_type(&PGP_ENCRYPTED));
                let mut children = match control.into_iter().next() {
                    Some(control) => vec![borrowed(control)],
                    None => vec![Node::Part(Cow::Owned(encryption_control(message)))],
                };
                children.extend(payload.into_iter().map(borrowed));
                container(MultipartKind::Encrypted, children)
            }
        };

        let mut root = root.unwrap_or_else(|| empty_body(message));
        let mut counter = 0;
        root.assign_boundaries(&message.boundary, &mut counter);
        root
    }

    fn assign_boundaries(&mut self, base: &str, counter: &mut usize) {
        if let Node::Multipart {
            boundary, children, ..
        } = self
        {
            *boundary = if *counter == 0 {
                base.to_owned()
            } else {
                format!("{}_{}", counter, base)
            };
            *counter += 1;
            for child in children {
                child.assign_boundaries(base, counter);
            }
        }
    }
}

fn borrowed(part: &Part) -> Node<'_> {
    Node::Part(Cow::Borrowed(part))
}

/// alternative, then related for embeds, then mixed for attachments
fn content<'a>(
    parts: Vec<&'a Part>,
    embeds: &'a [Attachment],
    attachments: &'a [Attachment],
) -> Option<Node<'a>> {
    let body = container(
        MultipartKind::Alternative,
        parts.into_iter().map(borrowed).collect(),
    );

    let mut related: Vec<Node<'a>> = body.into_iter().collect();
    related.extend(embeds.iter().map(Node::File));
    let related = container(MultipartKind::Related, related);

    let mut mixed: Vec<Node<'a>> = related.into_iter().collect();
    mixed.extend(attachments.iter().map(Node::File));
    container(MultipartKind::Mixed, mixed)
}

/// Wraps `children` unless a single one is left, which stands on its own
fn container(kind: MultipartKind, mut children: Vec<Node<'_>>) -> Option<Node<'_>> {
    match children.len() {
        0 => None,
        1 => children.pop(),
        _ => Some(Node::Multipart {
            kind,
            boundary: String::new(),
            children,
        }),
    }
}

fn empty_body(message: &Message) -> Node<'static> {
    Node::Part(Cow::Owned(Part::new(
        mime::TEXT_PLAIN,
        message.charset.clone(),
        message.encoding,
        Arc::new(Vec::new()),
    )))
}

fn encryption_control(message: &Message) -> Part {
    Part::new(
        PGP_ENCRYPTED.clone(),
        message.charset.clone(),
        ContentTransferEncoding::SevenBit,
        Arc::new(String::from("Version: 1")),
    )
}

#[cfg(test)]
mod test {
    use super::{MultipartKind, Node};
    use crate::message::{header::PgpType, Message};

    /// Compact description of a tree, with boundaries
    fn describe(node: &Node<'_>) -> String {
        match node {
            Node::Part(part) => part.content_type().essence_str().to_owned(),
            Node::File(file) => file.name().to_owned(),
            Node::Multipart {
                kind,
                boundary,
                children,
            } => {
                let children: Vec<String> = children.iter().map(describe).collect();
                format!("{:?}[{}]({})", kind, boundary, children.join(","))
            }
        }
    }

    fn message() -> Message {
        Message::builder().boundary("B").build()
    }

    #[test]
    fn empty_message() {
        let message = message();
        assert_eq!(describe(&Node::of(&message)), "text/plain");
    }

    #[test]
    fn nesting_grows_with_content() {
        let mut message = message();
        message.set_body_string(mime::TEXT_PLAIN, "plain");
        assert_eq!(describe(&Node::of(&message)), "text/plain");

        message.add_alternative_string(mime::TEXT_HTML, "<p>html</p>");
        assert_eq!(
            describe(&Node::of(&message)),
            "Alternative[B](text/plain,text/html)"
        );

        message.embed_bytes("logo.png", b"png".to_vec());
        assert_eq!(
            describe(&Node::of(&message)),
            "Related[B](Alternative[1_B](text/plain,text/html),logo.png)"
        );

        message.attach_bytes("report.pdf", b"pdf".to_vec());
        assert_eq!(
            describe(&Node::of(&message)),
            "Mixed[B](Related[1_B](Alternative[2_B](text/plain,text/html),logo.png),report.pdf)"
        );
    }

    #[test]
    fn single_file_stands_alone() {
        let mut message = message();
        message.attach_bytes("report.pdf", b"pdf".to_vec());
        assert_eq!(describe(&Node::of(&message)), "report.pdf");

        message.attach_bytes("notes.txt", b"txt".to_vec());
        assert_eq!(
            describe(&Node::of(&message)),
            "Mixed[B](report.pdf,notes.txt)"
        );
    }

    #[test]
    fn attachments_without_embeds() {
        let mut message = message();
        message.set_body_string(mime::TEXT_PLAIN, "plain");
        message.attach_bytes("report.pdf", b"pdf".to_vec());
        assert_eq!(
            describe(&Node::of(&message)),
            "Mixed[B](text/plain,report.pdf)"
        );
    }

    #[test]
    fn deleted_parts_are_skipped() {
        let mut message = message();
        message.set_body_string(mime::TEXT_PLAIN, "plain");
        message.add_alternative_string(mime::TEXT_HTML, "<p>html</p>");
        message.parts_mut()[0].delete();
        assert_eq!(describe(&Node::of(&message)), "text/html");
    }

    #[test]
    fn signed_is_outermost() {
        let mut message = Message::builder()
            .boundary("B")
            .pgp_type(PgpType::Signature)
            .build();
        message.set_body_string(mime::TEXT_PLAIN, "plain");
        message.attach_bytes("report.pdf", b"pdf".to_vec());
        message.add_alternative_string(
            "application/pgp-signature".parse().unwrap(),
            "-----BEGIN PGP SIGNATURE-----",
        );
        assert_eq!(
            describe(&Node::of(&message)),
            "Signed[B](Mixed[1_B](text/plain,report.pdf),application/pgp-signature)"
        );
    }

    #[test]
    fn encrypted_control_part() {
        let mut message = Message::builder()
            .boundary("B")
            .pgp_type(PgpType::Encrypted)
            .build();
        message.set_body_string(mime::APPLICATION_OCTET_STREAM, "-----BEGIN PGP MESSAGE-----");
        message.attach_bytes("report.pdf", b"pdf".to_vec());

        let root = Node::of(&message);
        assert_eq!(
            describe(&root),
            "Encrypted[B](application/pgp-encrypted,application/octet-stream)"
        );
        match root {
            Node::Multipart { children, .. } => match &children[0] {
                Node::Part(control) => assert_eq!(control.content().unwrap(), b"Version: 1"),
                other => panic!("unexpected control entity {:?}", other),
            },
            other => panic!("unexpected root {:?}", other),
        }
    }

    #[test]
    fn multipart_content_types() {
        assert_eq!(
            MultipartKind::Signed.content_type("B"),
            "multipart/signed; protocol=\"application/pgp-signature\"; micalg=pgp-sha256; boundary=\"B\""
        );
        assert_eq!(
            MultipartKind::Mixed.content_type("B"),
            "multipart/mixed; boundary=\"B\""
        );
    }
}

//! Provides a strongly typed way to build emails
//!
//! ### Creating messages
//!
//! This section explains how to create emails.
//!
//! ## Usage
//!
//! ### Format email messages
//!
//! #### With string body
//!
//! The easiest way how we can create email message with simple string.
//!
//! ```rust
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use missive::message::Message;
//!
//! let mut m = Message::builder().build();
//! m.set_from("NoBody <nobody@domain.tld>")?;
//! m.set_reply_to("Yuin <yuin@domain.tld>")?;
//! m.set_to(&["Hei <hei@domain.tld>"])?;
//! m.set_subject("Happy new year");
//! m.set_body_string(mime::TEXT_PLAIN, "Be happy!");
//!
//! let email = m.formatted()?;
//! # Ok(())
//! # }
//! ```
//!
//! Will produce:
//!
//! ```sh
//! From: "NoBody" <nobody@domain.tld>
//! Reply-To: "Yuin" <yuin@domain.tld>
//! To: "Hei" <hei@domain.tld>
//! Date: Sat, 12 Dec 2020 16:33:19 -0000
//! Message-ID: <4f2f2ed4-6bbd-4bd2-a1f8-3cc1b0b6e39c@localhost>
//! Subject: Happy new year
//! User-Agent: missive v0.1.0
//! X-Mailer: missive v0.1.0
//! MIME-Version: 1.0
//! Content-Type: text/plain; charset=UTF-8
//! Content-Transfer-Encoding: quoted-printable
//!
//! Be happy!
//! ```
//!
//! The body becomes `multipart/alternative` once a second rendering is added,
//! `multipart/related` with embedded files and `multipart/mixed` with attachments.
//!
//! ```rust
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! use missive::message::Message;
//!
//! let mut m = Message::builder().build();
//! m.set_from("NoBody <nobody@domain.tld>")?;
//! m.set_to(&["Hei <hei@domain.tld>"])?;
//! m.set_subject("Happy new year");
//! m.set_body_string(mime::TEXT_PLAIN, "Be happy!");
//! m.add_alternative_string(mime::TEXT_HTML, "<p><b>Be happy!</b></p>");
//! m.embed_bytes("logo.png", b"\x89PNG".to_vec());
//! m.attach_bytes("notes.txt", "Remember the party".as_bytes().to_vec());
//!
//! let email = m.formatted()?;
//! # Ok(())
//! # }
//! ```

use std::{
    collections::BTreeMap,
    error::Error as StdError,
    fs::{self, File},
    io::{self, Read, Seek, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use mime::Mime;

pub use self::{
    attachment::{Attachment, ResourceProvider},
    body::{FilePath, FnContent, Part, Seekable, WriteContent},
    mailbox::{Mailbox, Mailboxes},
    middleware::Middleware,
    reader::Reader,
    template::TemplateEngine,
};
use self::{
    attachment::base_name,
    header::{
        AddressHeaders, AddressKind, Charset, ContentTransferEncoding,
        HeaderName, Headers, Importance, MimeVersion, PgpType,
    },
    mailbox::split_list,
    status::DeliveryStatus,
};
use crate::{address::Envelope, Error};

mod attachment;
mod body;
pub mod encoded_word;
mod encoder;
pub mod header;
mod mailbox;
mod middleware;
mod reader;
mod status;
mod structure;
mod template;
mod writer;

const DEFAULT_MESSAGE_ID_DOMAIN: &str = "localhost";

const DEFAULT_USER_AGENT: &str = concat!("missive v", env!("CARGO_PKG_VERSION"));

const BOUNDARY_LENGTH: usize = 40;

/// Plain configuration of a new [`Message`]
///
/// **NOTE**: Enable feature "serde" to be able serialize/deserialize it using [serde](https://serde.rs/).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MessageOptions {
    /// Charset of the text parts and of the encoded header words
    pub charset: Charset,
    /// Transfer encoding of new body parts
    pub encoding: ContentTransferEncoding,
    pub mime_version: MimeVersion,
    /// Fixed multipart boundary, a random one is generated when unset
    pub boundary: Option<String>,
    pub pgp_type: PgpType,
    /// Do not add the default `User-Agent` and `X-Mailer` headers
    pub no_default_user_agent: bool,
}

impl Default for MessageOptions {
    fn default() -> Self {
        MessageOptions {
            charset: Charset::UTF_8,
            encoding: ContentTransferEncoding::QuotedPrintable,
            mime_version: MimeVersion::default(),
            boundary: None,
            pgp_type: PgpType::None,
            no_default_user_agent: false,
        }
    }
}

/// A builder for messages
#[derive(Debug, Clone, Default)]
pub struct MessageBuilder {
    options: MessageOptions,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MessageBuilder {
    /// Creates a new default message builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from previously loaded options
    pub fn options(mut self, options: MessageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.options.charset = charset;
        self
    }

    pub fn encoding(mut self, encoding: ContentTransferEncoding) -> Self {
        self.options.encoding = encoding;
        self
    }

    pub fn mime_version(mut self, mime_version: MimeVersion) -> Self {
        self.options.mime_version = mime_version;
        self
    }

    /// Uses a fixed boundary instead of a random one
    pub fn boundary<S: Into<String>>(mut self, boundary: S) -> Self {
        self.options.boundary = Some(boundary.into());
        self
    }

    pub fn pgp_type(mut self, pgp_type: PgpType) -> Self {
        self.options.pgp_type = pgp_type;
        self
    }

    /// Registers a middleware, they run in registration order
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn no_default_user_agent(mut self) -> Self {
        self.options.no_default_user_agent = true;
        self
    }

    pub fn build(self) -> Message {
        let options = self.options;
        Message {
            addresses: AddressHeaders::default(),
            headers: Headers::new(),
            preformatted: BTreeMap::new(),
            parts: Vec::new(),
            attachments: Vec::new(),
            embeds: Vec::new(),
            charset: options.charset,
            encoding: options.encoding,
            mime_version: options.mime_version,
            boundary: options.boundary.unwrap_or_else(random_boundary),
            pgp_type: options.pgp_type,
            middlewares: self.middlewares,
            no_default_user_agent: options.no_default_user_agent,
            status: DeliveryStatus::default(),
        }
    }
}

fn random_boundary() -> String {
    std::iter::repeat_with(fastrand::alphanumeric)
        .take(BOUNDARY_LENGTH)
        .collect()
}

fn message_id_domain() -> String {
    #[cfg(feature = "hostname")]
    {
        if let Some(name) = hostname::get().ok().and_then(|name| name.into_string().ok()) {
            if !name.is_empty() {
                return name;
            }
        }
    }
    DEFAULT_MESSAGE_ID_DOMAIN.to_owned()
}

fn parse_mailbox(candidate: &str) -> Result<Mailbox, Error> {
    candidate
        .parse()
        .map_err(|source| Error::InvalidAddress {
            candidate: candidate.to_owned(),
            source,
        })
}

fn format_mailbox(name: &str, address: &str) -> Result<Mailbox, Error> {
    let mailbox = parse_mailbox(address)?;
    Ok(Mailbox::new(Some(name.to_owned()), mailbox.email))
}

#[derive(Debug, Clone, Copy)]
enum FileList {
    Attachments,
    Embeds,
}

/// Email message which can be formatted and sent
///
/// Every collection of the message exists from construction on. Serializing the message
/// fixes the `Date`, `Message-ID` and `User-Agent` headers the first time, so that all
/// later renderings of the same message are byte-identical.
#[derive(Debug, Clone)]
pub struct Message {
    addresses: AddressHeaders,
    headers: Headers,
    preformatted: BTreeMap<HeaderName, String>,
    parts: Vec<Part>,
    attachments: Vec<Attachment>,
    embeds: Vec<Attachment>,
    charset: Charset,
    encoding: ContentTransferEncoding,
    mime_version: MimeVersion,
    boundary: String,
    pgp_type: PgpType,
    middlewares: Vec<Arc<dyn Middleware>>,
    no_default_user_agent: bool,
    status: DeliveryStatus,
}

macro_rules! recipient_methods {
    (
        $kind:expr,
        $set:ident,
        $add:ident,
        $add_format:ident,
        $ignore_invalid:ident,
        $from_string:ident,
        $get:ident,
        $strings:ident
    ) => {
        /// Replaces the recipients, failing on the first invalid candidate
        pub fn $set<I, S>(&mut self, candidates: I) -> Result<(), Error>
        where
            I: IntoIterator<Item = S>,
            S: AsRef<str>,
        {
            self.set_address($kind, candidates)
        }

        pub fn $add(&mut self, candidate: &str) -> Result<(), Error> {
            self.add_address($kind, candidate)
        }

        pub fn $add_format(&mut self, name: &str, address: &str) -> Result<(), Error> {
            self.add_address_format($kind, name, address)
        }

        /// Replaces the recipients with the valid candidates
        pub fn $ignore_invalid<I, S>(&mut self, candidates: I)
        where
            I: IntoIterator<Item = S>,
            S: AsRef<str>,
        {
            self.set_address_ignore_invalid($kind, candidates)
        }

        /// Replaces the recipients with a comma separated list
        pub fn $from_string(&mut self, list: &str) -> Result<(), Error> {
            self.set_address_from_string($kind, list)
        }

        pub fn $get(&self) -> &[Mailbox] {
            self.addresses($kind)
        }

        pub fn $strings(&self) -> Vec<String> {
            self.address_strings($kind)
        }
    };
}

impl Message {
    /// Creates a new message builder without headers
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// Creates a message with the default options
    pub fn new() -> Self {
        MessageBuilder::new().build()
    }

    // Configuration

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Changes the charset of new parts and encoded header words
    pub fn set_charset(&mut self, charset: Charset) {
        self.charset = charset;
    }

    pub fn encoding(&self) -> ContentTransferEncoding {
        self.encoding
    }

    /// Changes the transfer encoding of new parts
    pub fn set_encoding(&mut self, encoding: ContentTransferEncoding) {
        self.encoding = encoding;
    }

    pub fn mime_version(&self) -> MimeVersion {
        self.mime_version
    }

    pub fn set_mime_version(&mut self, mime_version: MimeVersion) {
        self.mime_version = mime_version;
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn set_boundary<S: Into<String>>(&mut self, boundary: S) {
        self.boundary = boundary.into();
    }

    pub fn pgp_type(&self) -> PgpType {
        self.pgp_type
    }

    pub fn set_pgp_type(&mut self, pgp_type: PgpType) {
        self.pgp_type = pgp_type;
    }

    // Addresses

    /// Replaces the mailboxes of `kind`
    ///
    /// Nothing is changed when one of the candidates is invalid. `From` and
    /// `EnvelopeFrom` only keep the first mailbox.
    pub fn set_address<I, S>(&mut self, kind: AddressKind, candidates: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mailboxes = candidates
            .into_iter()
            .map(|candidate| parse_mailbox(candidate.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.addresses.set(kind, mailboxes);
        Ok(())
    }

    /// Appends a mailbox to `kind`
    pub fn add_address(&mut self, kind: AddressKind, candidate: &str) -> Result<(), Error> {
        let mailbox = parse_mailbox(candidate)?;
        self.addresses.push(kind, mailbox);
        Ok(())
    }

    /// Appends a mailbox built from a display name and an address
    pub fn add_address_format(
        &mut self,
        kind: AddressKind,
        name: &str,
        address: &str,
    ) -> Result<(), Error> {
        let mailbox = format_mailbox(name, address)?;
        self.addresses.push(kind, mailbox);
        Ok(())
    }

    /// Replaces the mailboxes of `kind` with the candidates that are valid, in order
    pub fn set_address_ignore_invalid<I, S>(&mut self, kind: AddressKind, candidates: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mailboxes = Vec::new();
        for candidate in candidates {
            match parse_mailbox(candidate.as_ref()) {
                Ok(mailbox) => mailboxes.push(mailbox),
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(?kind, error = %_err, "dropping invalid address");
                }
            }
        }
        self.addresses.set(kind, mailboxes);
    }

    /// Replaces the mailboxes of `kind` with a comma separated list
    pub fn set_address_from_string(&mut self, kind: AddressKind, list: &str) -> Result<(), Error> {
        self.set_address(kind, split_list(list))
    }

    pub fn addresses(&self, kind: AddressKind) -> &[Mailbox] {
        self.addresses.get(kind)
    }

    /// Mailboxes of `kind` rendered as `"Name" <address>` or `<address>`
    pub fn address_strings(&self, kind: AddressKind) -> Vec<String> {
        self.addresses
            .get(kind)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn set_from(&mut self, candidate: &str) -> Result<(), Error> {
        self.set_address(AddressKind::From, Some(candidate))
    }

    pub fn set_from_format(&mut self, name: &str, address: &str) -> Result<(), Error> {
        let mailbox = format_mailbox(name, address)?;
        self.addresses.set(AddressKind::From, vec![mailbox]);
        Ok(())
    }

    /// Sets the SMTP envelope sender, which takes precedence over `From` for delivery
    pub fn set_envelope_from(&mut self, candidate: &str) -> Result<(), Error> {
        self.set_address(AddressKind::EnvelopeFrom, Some(candidate))
    }

    pub fn set_envelope_from_format(&mut self, name: &str, address: &str) -> Result<(), Error> {
        let mailbox = format_mailbox(name, address)?;
        self.addresses.set(AddressKind::EnvelopeFrom, vec![mailbox]);
        Ok(())
    }

    pub fn set_reply_to(&mut self, candidate: &str) -> Result<(), Error> {
        self.set_address(AddressKind::ReplyTo, Some(candidate))
    }

    pub fn set_reply_to_format(&mut self, name: &str, address: &str) -> Result<(), Error> {
        let mailbox = format_mailbox(name, address)?;
        self.addresses.set(AddressKind::ReplyTo, vec![mailbox]);
        Ok(())
    }

    recipient_methods!(
        AddressKind::To,
        set_to,
        add_to,
        add_to_format,
        set_to_ignore_invalid,
        set_to_from_string,
        to,
        to_strings
    );

    recipient_methods!(
        AddressKind::Cc,
        set_cc,
        add_cc,
        add_cc_format,
        set_cc_ignore_invalid,
        set_cc_from_string,
        cc,
        cc_strings
    );

    recipient_methods!(
        AddressKind::Bcc,
        set_bcc,
        add_bcc,
        add_bcc_format,
        set_bcc_ignore_invalid,
        set_bcc_from_string,
        bcc,
        bcc_strings
    );

    pub fn from(&self) -> &[Mailbox] {
        self.addresses(AddressKind::From)
    }

    pub fn from_strings(&self) -> Vec<String> {
        self.address_strings(AddressKind::From)
    }

    /// Requests a message disposition notification (RFC 8098) to be sent to the candidates
    pub fn request_mdn_to<I, S>(&mut self, candidates: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_address(AddressKind::DispositionNotificationTo, candidates)
    }

    pub fn request_mdn_to_format(&mut self, name: &str, address: &str) -> Result<(), Error> {
        let mailbox = format_mailbox(name, address)?;
        self.addresses
            .set(AddressKind::DispositionNotificationTo, vec![mailbox]);
        Ok(())
    }

    pub fn request_mdn_add_to(&mut self, candidate: &str) -> Result<(), Error> {
        self.add_address(AddressKind::DispositionNotificationTo, candidate)
    }

    pub fn request_mdn_add_to_format(&mut self, name: &str, address: &str) -> Result<(), Error> {
        self.add_address_format(AddressKind::DispositionNotificationTo, name, address)
    }

    // Generic headers

    /// Replaces the values of a header, encoding each with the message charset when needed
    pub fn set_header<I, S>(&mut self, name: HeaderName, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let charset = self.charset.as_str();
        let values = values
            .into_iter()
            .map(|value| encoded_word::encode_q(charset, value.as_ref()))
            .collect();
        self.headers.set(name, values);
    }

    /// Values of a header as they are written
    pub fn header(&self, name: &HeaderName) -> &[String] {
        self.headers.get(name)
    }

    /// Sets a header that is written verbatim, without encoding or folding
    pub fn set_header_preformatted<S: Into<String>>(&mut self, name: HeaderName, raw: S) {
        self.preformatted.insert(name, raw.into());
    }

    pub fn header_preformatted(&self, name: &HeaderName) -> Option<&str> {
        self.preformatted.get(name).map(String::as_str)
    }

    pub fn set_subject<S: AsRef<str>>(&mut self, subject: S) {
        self.set_header(HeaderName::SUBJECT, Some(subject));
    }

    /// The decoded `Subject`
    pub fn subject(&self) -> String {
        encoded_word::decode(&self.header(&HeaderName::SUBJECT).join(", "))
    }

    /// Generates a random `Message-ID`
    pub fn set_message_id(&mut self) {
        let id = format!("{}@{}", uuid::Uuid::new_v4(), message_id_domain());
        self.set_message_id_with_value(id);
    }

    /// Sets the `Message-ID`, angle brackets are added around `id`
    ///
    /// Whitespace and control characters are dropped from `id`.
    pub fn set_message_id_with_value<S: AsRef<str>>(&mut self, id: S) {
        let id: String = id
            .as_ref()
            .chars()
            .filter(|c| !c.is_control() && !c.is_whitespace())
            .collect();
        let id = id.trim_start_matches('<').trim_end_matches('>');
        self.headers
            .set(HeaderName::MESSAGE_ID, vec![format!("<{}>", id)]);
    }

    /// The `Message-ID` with its angle brackets, empty when unset
    pub fn message_id(&self) -> &str {
        self.headers
            .get(&HeaderName::MESSAGE_ID)
            .first()
            .map_or("", String::as_str)
    }

    /// Sets the `Date` to the current time
    pub fn set_date(&mut self) {
        self.set_date_with_value(SystemTime::now());
    }

    /// Sets the `Date`, written in the RFC 5322 format
    pub fn set_date_with_value(&mut self, date: SystemTime) {
        let date = httpdate::fmt_http_date(date);
        let date = match date.strip_suffix("GMT") {
            Some(prefix) => format!("{}-0000", prefix),
            None => date,
        };
        self.headers.set(HeaderName::DATE, vec![date]);
    }

    /// Marks the message as bulk mail and asks auto responders to stay silent
    pub fn set_bulk(&mut self) {
        self.set_header(HeaderName::PRECEDENCE, Some("bulk"));
        self.set_header(HeaderName::X_AUTO_RESPONSE_SUPPRESS, Some("All"));
    }

    /// Sets the importance headers, [`Importance::Normal`] sets nothing
    pub fn set_importance(&mut self, importance: Importance) {
        if let (Some(text), Some(num), Some(x_priority)) = (
            importance.as_str(),
            importance.num_str(),
            importance.x_priority(),
        ) {
            self.set_header(HeaderName::IMPORTANCE, Some(text));
            self.set_header(HeaderName::PRIORITY, Some(num));
            self.set_header(HeaderName::X_PRIORITY, Some(x_priority));
            self.set_header(HeaderName::X_MSMAIL_PRIORITY, Some(num));
        }
    }

    pub fn set_organization<S: AsRef<str>>(&mut self, organization: S) {
        self.set_header(HeaderName::ORGANIZATION, Some(organization));
    }

    /// Sets both `User-Agent` and `X-Mailer`
    pub fn set_user_agent<S: AsRef<str>>(&mut self, user_agent: S) {
        self.set_header(HeaderName::USER_AGENT, Some(user_agent.as_ref()));
        self.set_header(HeaderName::X_MAILER, Some(user_agent.as_ref()));
    }

    // Envelope

    /// Envelope sender, `EnvelopeFrom` before `From`
    ///
    /// With `full` the display name is included, as in `"Name" <user@domain.tld>`.
    pub fn sender(&self, full: bool) -> Result<String, Error> {
        let mailbox = self.sender_mailbox().ok_or(Error::NoFromAddress)?;
        Ok(if full {
            mailbox.to_string()
        } else {
            mailbox.email.to_string()
        })
    }

    /// Envelope recipients: `To`, `Cc` and `Bcc`, in that order
    pub fn recipients(&self) -> Result<Vec<String>, Error> {
        let recipients: Vec<String> = self
            .recipient_mailboxes()
            .map(|mailbox| mailbox.email.to_string())
            .collect();
        if recipients.is_empty() {
            return Err(Error::NoRecipient);
        }
        Ok(recipients)
    }

    pub fn envelope(&self) -> Result<Envelope, Error> {
        let sender = self.sender_mailbox().ok_or(Error::NoFromAddress)?;
        let recipients = self
            .recipient_mailboxes()
            .map(|mailbox| mailbox.email.clone())
            .collect();
        Envelope::new(Some(sender.email.clone()), recipients)
    }

    fn sender_mailbox(&self) -> Option<&Mailbox> {
        self.addresses
            .get(AddressKind::EnvelopeFrom)
            .first()
            .or_else(|| self.addresses.get(AddressKind::From).first())
    }

    fn recipient_mailboxes(&self) -> impl Iterator<Item = &Mailbox> {
        let kinds: &'static [AddressKind] = &[AddressKind::To, AddressKind::Cc, AddressKind::Bcc];
        kinds
            .iter()
            .flat_map(move |kind| self.addresses.get(*kind).iter())
    }

    // Body parts

    fn new_part(&self, content_type: Mime, content: Arc<dyn WriteContent>) -> Part {
        Part::new(content_type, self.charset.clone(), self.encoding, content)
    }

    fn push_part(&mut self, part: Part) -> &mut Part {
        self.parts.push(part);
        let last = self.parts.len() - 1;
        &mut self.parts[last]
    }

    /// Replaces all parts with a single one holding `body`
    pub fn set_body_string<S: Into<String>>(&mut self, content_type: Mime, body: S) -> &mut Part {
        self.set_body_writer(content_type, body.into())
    }

    /// Replaces all parts with a single one produced by `content`
    pub fn set_body_writer<C: WriteContent + 'static>(
        &mut self,
        content_type: Mime,
        content: C,
    ) -> &mut Part {
        self.parts.clear();
        let part = self.new_part(content_type, Arc::new(content));
        self.push_part(part)
    }

    /// Replaces all parts with a single one rendered from a template
    pub fn set_body_template<E, D>(
        &mut self,
        content_type: Mime,
        engine: &E,
        name: &str,
        data: &D,
    ) -> Result<&mut Part, Error>
    where
        E: TemplateEngine<D> + ?Sized,
        D: ?Sized,
    {
        let body = template::render("set_body_template", engine, name, data)?;
        Ok(self.set_body_string(content_type, body))
    }

    /// Adds another rendering of the body
    pub fn add_alternative_string<S: Into<String>>(
        &mut self,
        content_type: Mime,
        body: S,
    ) -> &mut Part {
        self.add_alternative_writer(content_type, body.into())
    }

    pub fn add_alternative_writer<C: WriteContent + 'static>(
        &mut self,
        content_type: Mime,
        content: C,
    ) -> &mut Part {
        let part = self.new_part(content_type, Arc::new(content));
        self.push_part(part)
    }

    pub fn add_alternative_template<E, D>(
        &mut self,
        content_type: Mime,
        engine: &E,
        name: &str,
        data: &D,
    ) -> Result<&mut Part, Error>
    where
        E: TemplateEngine<D> + ?Sized,
        D: ?Sized,
    {
        let body = template::render("add_alternative_template", engine, name, data)?;
        Ok(self.add_alternative_string(content_type, body))
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut [Part] {
        &mut self.parts
    }

    pub fn unset_all_parts(&mut self) {
        self.parts.clear();
    }

    // Attachments and embedded files

    fn push_file(&mut self, list: FileList, file: Attachment) -> &mut Attachment {
        let files = match list {
            FileList::Attachments => &mut self.attachments,
            FileList::Embeds => &mut self.embeds,
        };
        files.push(match list {
            FileList::Attachments => file,
            FileList::Embeds => file.inline(),
        });
        let last = files.len() - 1;
        &mut files[last]
    }

    fn try_push_path(&mut self, list: FileList, path: &Path) -> Result<&mut Attachment, Error> {
        let file_error = |source| Error::File {
            path: path.to_owned(),
            source,
        };
        let metadata = fs::metadata(path).map_err(file_error)?;
        if !metadata.is_file() {
            return Err(file_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = Attachment::new(name, Arc::new(FilePath(path.to_owned())));
        Ok(self.push_file(list, file))
    }

    fn push_path(&mut self, list: FileList, path: &Path) -> Option<&mut Attachment> {
        match self.try_push_path(list, path) {
            Ok(file) => Some(file),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_err, "skipping file");
                None
            }
        }
    }

    fn push_reader<R: Read>(
        &mut self,
        list: FileList,
        name: String,
        mut reader: R,
    ) -> Result<&mut Attachment, Error> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content).map_err(Error::Content)?;
        Ok(self.push_file(list, Attachment::new(name, Arc::new(content))))
    }

    fn try_push_resource<P>(
        &mut self,
        list: FileList,
        provider: &P,
        path: &str,
    ) -> Result<&mut Attachment, Error>
    where
        P: ResourceProvider + ?Sized,
    {
        let content = provider.open(path).map_err(|source| Error::File {
            path: PathBuf::from(path),
            source,
        })?;
        let file = Attachment::new(base_name(path), Arc::new(content));
        Ok(self.push_file(list, file))
    }

    fn push_resource<P>(&mut self, list: FileList, provider: &P, path: &str) -> Option<&mut Attachment>
    where
        P: ResourceProvider + ?Sized,
    {
        match self.try_push_resource(list, provider, path) {
            Ok(file) => Some(file),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_err, "skipping resource");
                None
            }
        }
    }

    /// Attaches a file from disk, skipping it when it can not be read
    ///
    /// The file is read every time the message is serialized.
    pub fn attach_file<P: AsRef<Path>>(&mut self, path: P) -> Option<&mut Attachment> {
        self.push_path(FileList::Attachments, path.as_ref())
    }

    /// Attaches a file from disk, failing when it can not be read
    pub fn try_attach_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Attachment, Error> {
        self.try_push_path(FileList::Attachments, path.as_ref())
    }

    pub fn attach_bytes<S, B>(&mut self, name: S, content: B) -> &mut Attachment
    where
        S: Into<String>,
        B: Into<Vec<u8>>,
    {
        let file = Attachment::new(name, Arc::new(content.into()));
        self.push_file(FileList::Attachments, file)
    }

    /// Attaches the content of `reader`, which is read right away
    pub fn attach_reader<S: Into<String>, R: Read>(
        &mut self,
        name: S,
        reader: R,
    ) -> Result<&mut Attachment, Error> {
        self.push_reader(FileList::Attachments, name.into(), reader)
    }

    /// Attaches a seekable source, which is rewound and read at every serialization
    pub fn attach_read_seeker<S, R>(&mut self, name: S, reader: R) -> &mut Attachment
    where
        S: Into<String>,
        R: Read + Seek + Send + 'static,
    {
        let file = Attachment::new(name, Arc::new(Seekable::new(reader)));
        self.push_file(FileList::Attachments, file)
    }

    /// Attaches content produced at every serialization
    pub fn attach_writer<S, C>(&mut self, name: S, content: C) -> &mut Attachment
    where
        S: Into<String>,
        C: WriteContent + 'static,
    {
        let file = Attachment::new(name, Arc::new(content));
        self.push_file(FileList::Attachments, file)
    }

    pub fn attach_template<S, E, D>(
        &mut self,
        name: S,
        engine: &E,
        template_name: &str,
        data: &D,
    ) -> Result<&mut Attachment, Error>
    where
        S: Into<String>,
        E: TemplateEngine<D> + ?Sized,
        D: ?Sized,
    {
        let content = template::render("attach_template", engine, template_name, data)?;
        Ok(self.attach_bytes(name, content))
    }

    /// Attaches a resource, skipping it when the provider does not have it
    pub fn attach_from_provider<P>(&mut self, provider: &P, path: &str) -> Option<&mut Attachment>
    where
        P: ResourceProvider + ?Sized,
    {
        self.push_resource(FileList::Attachments, provider, path)
    }

    pub fn try_attach_from_provider<P>(
        &mut self,
        provider: &P,
        path: &str,
    ) -> Result<&mut Attachment, Error>
    where
        P: ResourceProvider + ?Sized,
    {
        self.try_push_resource(FileList::Attachments, provider, path)
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn set_attachments(&mut self, attachments: Vec<Attachment>) {
        self.attachments = attachments;
    }

    pub fn unset_all_attachments(&mut self) {
        self.attachments.clear();
    }

    /// Embeds a file from disk, skipping it when it can not be read
    pub fn embed_file<P: AsRef<Path>>(&mut self, path: P) -> Option<&mut Attachment> {
        self.push_path(FileList::Embeds, path.as_ref())
    }

    pub fn try_embed_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Attachment, Error> {
        self.try_push_path(FileList::Embeds, path.as_ref())
    }

    pub fn embed_bytes<S, B>(&mut self, name: S, content: B) -> &mut Attachment
    where
        S: Into<String>,
        B: Into<Vec<u8>>,
    {
        let file = Attachment::new(name, Arc::new(content.into()));
        self.push_file(FileList::Embeds, file)
    }

    pub fn embed_reader<S: Into<String>, R: Read>(
        &mut self,
        name: S,
        reader: R,
    ) -> Result<&mut Attachment, Error> {
        self.push_reader(FileList::Embeds, name.into(), reader)
    }

    pub fn embed_read_seeker<S, R>(&mut self, name: S, reader: R) -> &mut Attachment
    where
        S: Into<String>,
        R: Read + Seek + Send + 'static,
    {
        let file = Attachment::new(name, Arc::new(Seekable::new(reader)));
        self.push_file(FileList::Embeds, file)
    }

    pub fn embed_writer<S, C>(&mut self, name: S, content: C) -> &mut Attachment
    where
        S: Into<String>,
        C: WriteContent + 'static,
    {
        let file = Attachment::new(name, Arc::new(content));
        self.push_file(FileList::Embeds, file)
    }

    pub fn embed_template<S, E, D>(
        &mut self,
        name: S,
        engine: &E,
        template_name: &str,
        data: &D,
    ) -> Result<&mut Attachment, Error>
    where
        S: Into<String>,
        E: TemplateEngine<D> + ?Sized,
        D: ?Sized,
    {
        let content = template::render("embed_template", engine, template_name, data)?;
        Ok(self.embed_bytes(name, content))
    }

    pub fn embed_from_provider<P>(&mut self, provider: &P, path: &str) -> Option<&mut Attachment>
    where
        P: ResourceProvider + ?Sized,
    {
        self.push_resource(FileList::Embeds, provider, path)
    }

    pub fn try_embed_from_provider<P>(
        &mut self,
        provider: &P,
        path: &str,
    ) -> Result<&mut Attachment, Error>
    where
        P: ResourceProvider + ?Sized,
    {
        self.try_push_resource(FileList::Embeds, provider, path)
    }

    pub fn embeds(&self) -> &[Attachment] {
        &self.embeds
    }

    /// Replaces the embedded files, each one is marked inline
    pub fn set_embeds(&mut self, embeds: Vec<Attachment>) {
        self.embeds = embeds.into_iter().map(Attachment::inline).collect();
    }

    pub fn unset_all_embeds(&mut self) {
        self.embeds.clear();
    }

    // Middlewares

    /// Runs every middleware on the message itself, in registration order
    pub fn apply_middlewares(&mut self) {
        self.apply_middlewares_except(None);
    }

    fn apply_middlewares_except(&mut self, skip: Option<&str>) {
        let middlewares = self.middlewares.clone();
        for middleware in middlewares.iter() {
            if skip == Some(middleware.kind()) {
                #[cfg(feature = "tracing")]
                tracing::debug!(kind = middleware.kind(), "skipping middleware");
                continue;
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(kind = middleware.kind(), "applying middleware");
            middleware.handle(self);
        }
    }

    // Serialization

    /// Adds the headers every message carries unless they are already set
    fn set_default_headers(&mut self) {
        if !self.headers.contains(&HeaderName::DATE) {
            self.set_date();
        }
        if !self.headers.contains(&HeaderName::MESSAGE_ID) {
            self.set_message_id();
        }
        if !self.no_default_user_agent
            && !self.headers.contains(&HeaderName::USER_AGENT)
            && !self.headers.contains(&HeaderName::X_MAILER)
        {
            self.set_user_agent(DEFAULT_USER_AGENT);
        }
    }

    fn render(&mut self, sink: &mut dyn Write, skip: Option<&str>) -> Result<u64, Error> {
        self.set_default_headers();
        if self.middlewares.is_empty() {
            return writer::write_message(self, sink);
        }

        let mut message = self.clone();
        message.apply_middlewares_except(skip);
        writer::write_message(&message, sink)
    }

    /// Serializes the message into `sink` and returns the number of bytes written
    ///
    /// Middlewares run on a copy of the message, the message itself is left as it is.
    pub fn write_to<W: Write>(&mut self, mut sink: W) -> Result<u64, Error> {
        self.render(&mut sink, None)
    }

    /// Like [`Message::write_to`] without the middlewares of the given kind
    pub fn write_to_skip_middleware<W: Write>(
        &mut self,
        mut sink: W,
        kind: &str,
    ) -> Result<u64, Error> {
        self.render(&mut sink, Some(kind))
    }

    /// Serializes the message into a buffer
    pub fn formatted(&mut self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Serializes the message into a file, replacing it when it exists
    pub fn write_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::File {
            path: path.to_owned(),
            source,
        })?;
        self.write_to(io::BufWriter::new(file))?;
        Ok(())
    }

    /// Serializes the message into a new `.eml` file in the temporary directory
    pub fn write_to_temp_file(&mut self) -> Result<PathBuf, Error> {
        let path = std::env::temp_dir().join(format!("{}.eml", uuid::Uuid::new_v4()));
        self.write_to_file(&path)?;
        Ok(path)
    }

    /// Renders the message for pull based consumers
    ///
    /// A rendering failure does not fail the call, it is kept in the reader.
    pub fn new_reader(&mut self) -> Reader {
        Reader::new(self.formatted())
    }

    /// Renders the message again into an existing reader and rewinds it
    pub fn update_reader(&mut self, reader: &mut Reader) {
        reader.replace(self.formatted());
    }

    /// Clears addresses, headers, parts and files, keeping the configuration
    pub fn reset(&mut self) {
        self.addresses.clear();
        self.headers.clear();
        self.preformatted.clear();
        self.parts.clear();
        self.attachments.clear();
        self.embeds.clear();
        self.status = DeliveryStatus::default();
    }

    // Delivery status

    /// Whether the last delivery attempt succeeded
    pub fn is_delivered(&self) -> bool {
        self.status.is_delivered()
    }

    pub fn has_send_error(&self) -> bool {
        self.status.error().is_some()
    }

    pub fn send_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.status.error().map(|error| &**error)
    }

    /// Whether the last delivery failed with an error that may go away when retrying
    ///
    /// Errors that are not a [`SendError`](crate::transport::SendError) are permanent.
    pub fn send_error_is_temporary(&self) -> bool {
        self.status.is_temporary()
    }

    /// Records a successful delivery
    pub fn set_delivered(&mut self) {
        self.status.set_delivered();
    }

    /// Records a failed delivery
    pub fn set_send_error<E: StdError + Send + Sync + 'static>(&mut self, error: E) {
        self.status.set_error(Arc::new(error));
    }

    pub(crate) fn set_shared_send_error(&mut self, error: Arc<dyn StdError + Send + Sync>) {
        self.status.set_error(error);
    }
}

impl Default for Message {
    fn default() -> Self {
        Message::new()
    }
}

#[cfg(test)]
mod test {
    use super::{header::AddressKind, Message, MessageOptions};
    use crate::message::header::{
        Charset, ContentTransferEncoding, HeaderName, Importance, PgpType,
    };
    use crate::Error;
    use std::time::{Duration, SystemTime};

    #[test]
    fn from_keeps_first_address() {
        let mut message = Message::new();
        message
            .set_address(AddressKind::From, &["a@domain.tld", "b@domain.tld"])
            .unwrap();
        assert_eq!(message.from_strings(), vec!["<a@domain.tld>"]);

        message
            .set_to(&["Toni <a@domain.tld>", "b@domain.tld"])
            .unwrap();
        assert_eq!(
            message.to_strings(),
            vec!["\"Toni\" <a@domain.tld>", "<b@domain.tld>"]
        );
    }

    #[test]
    fn strict_setter_keeps_state() {
        let mut message = Message::new();
        message.set_to(&["a@domain.tld"]).unwrap();
        let err = message
            .set_to(&["b@domain.tld", "invalid"])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { ref candidate, .. } if candidate == "invalid"));
        assert_eq!(message.to_strings(), vec!["<a@domain.tld>"]);
    }

    #[test]
    fn ignore_invalid() {
        let mut message = Message::new();
        message.set_cc_ignore_invalid(&["a@domain.tld", "invalid", "c@domain.tld"]);
        assert_eq!(
            message.cc_strings(),
            vec!["<a@domain.tld>", "<c@domain.tld>"]
        );

        message.set_cc_ignore_invalid(&["invalid", "@"]);
        assert!(message.cc().is_empty());
    }

    #[test]
    fn address_list_from_string() {
        let mut message = Message::new();
        message
            .set_bcc_from_string("a@domain.tld, \"Tester, Toni\" <b@domain.tld>,")
            .unwrap();
        assert_eq!(
            message.bcc_strings(),
            vec!["<a@domain.tld>", "\"Tester, Toni\" <b@domain.tld>"]
        );
    }

    #[test]
    fn formatted_addresses() {
        let mut message = Message::new();
        message.set_from_format("Toni Tester", "toni@domain.tld").unwrap();
        message.add_to_format("Tina", "tina@domain.tld").unwrap();
        message.add_to("<tom@domain.tld>").unwrap();
        message.request_mdn_to_format("Toni", "toni@domain.tld").unwrap();
        message.request_mdn_add_to("tina@domain.tld").unwrap();

        assert_eq!(message.from_strings(), vec!["\"Toni Tester\" <toni@domain.tld>"]);
        assert_eq!(
            message.to_strings(),
            vec!["\"Tina\" <tina@domain.tld>", "<tom@domain.tld>"]
        );
        assert_eq!(
            message.address_strings(AddressKind::DispositionNotificationTo),
            vec!["\"Toni\" <toni@domain.tld>", "<tina@domain.tld>"]
        );
    }

    #[test]
    fn sender_and_recipients() {
        let mut message = Message::new();
        assert!(matches!(message.sender(false), Err(Error::NoFromAddress)));
        assert!(matches!(message.recipients(), Err(Error::NoRecipient)));

        message.set_from("Toni <toni@domain.tld>").unwrap();
        assert_eq!(message.sender(false).unwrap(), "toni@domain.tld");
        assert_eq!(message.sender(true).unwrap(), "\"Toni\" <toni@domain.tld>");

        message.set_envelope_from("bounce@domain.tld").unwrap();
        assert_eq!(message.sender(false).unwrap(), "bounce@domain.tld");
        assert_eq!(message.sender(true).unwrap(), "<bounce@domain.tld>");

        message.add_bcc("c@domain.tld").unwrap();
        message.add_cc("b@domain.tld").unwrap();
        message.add_to("a@domain.tld").unwrap();
        assert_eq!(
            message.recipients().unwrap(),
            vec!["a@domain.tld", "b@domain.tld", "c@domain.tld"]
        );

        let envelope = message.envelope().unwrap();
        assert_eq!(envelope.from().unwrap().to_string(), "bounce@domain.tld");
        assert_eq!(envelope.to().len(), 3);
    }

    #[test]
    fn generic_headers() {
        let mut message = Message::new();
        message.set_header(HeaderName::CONTENT_LANGUAGE, &["de", "en"]);
        message.set_subject("Héllô");
        message.set_header_preformatted(HeaderName::new("X-Custom").unwrap(), "=?raw?=");

        assert_eq!(message.header(&HeaderName::CONTENT_LANGUAGE), &["de", "en"]);
        assert_eq!(
            message.header(&HeaderName::SUBJECT),
            &["=?UTF-8?q?H=C3=A9ll=C3=B4?="]
        );
        assert_eq!(message.subject(), "Héllô");
        assert_eq!(
            message.header_preformatted(&HeaderName::new("x-custom").unwrap()),
            Some("=?raw?=")
        );
    }

    #[test]
    fn message_id() {
        let mut message = Message::new();
        assert_eq!(message.message_id(), "");
        message.set_message_id_with_value("12345.6789@domain.com");
        assert_eq!(message.message_id(), "<12345.6789@domain.com>");
        message.set_message_id_with_value("<abc@domain.com>");
        assert_eq!(message.message_id(), "<abc@domain.com>");

        message.set_message_id();
        let first = message.message_id().to_owned();
        message.set_message_id();
        assert_ne!(first, message.message_id());
        assert!(first.starts_with('<') && first.ends_with('>') && first.contains('@'));
    }

    #[test]
    fn message_id_stays_on_one_line() {
        let mut message = Message::new();
        message.set_from("from@domain.tld").unwrap();
        message.set_to(&["to@domain.tld"]).unwrap();
        message.set_message_id_with_value("id@x>\r\nBcc: victim@evil.tld\r\nX-Y: <z");
        assert_eq!(message.message_id(), "<id@x>Bcc:victim@evil.tldX-Y:<z>");

        let email = String::from_utf8(message.formatted().unwrap()).unwrap();
        let head = email.split("\r\n\r\n").next().unwrap();
        assert!(!head.lines().any(|line| line.starts_with("Bcc:")));
        assert!(!head.lines().any(|line| line.starts_with("X-Y:")));
        assert!(head.contains("Message-ID: <id@x>Bcc:victim@evil.tldX-Y:<z>\r\n"));
    }

    #[test]
    fn date_with_value() {
        let mut message = Message::new();
        message.set_date_with_value(SystemTime::UNIX_EPOCH + Duration::from_secs(784_111_777));
        assert_eq!(
            message.header(&HeaderName::DATE),
            &["Sun, 06 Nov 1994 08:49:37 -0000"]
        );
    }

    #[test]
    fn bulk_importance_organization() {
        let mut message = Message::new();
        message.set_bulk();
        message.set_importance(Importance::High);
        message.set_organization("ACME Inc.");
        message.set_user_agent("test suite");

        assert_eq!(message.header(&HeaderName::PRECEDENCE), &["bulk"]);
        assert_eq!(message.header(&HeaderName::X_AUTO_RESPONSE_SUPPRESS), &["All"]);
        assert_eq!(message.header(&HeaderName::IMPORTANCE), &["high"]);
        assert_eq!(message.header(&HeaderName::PRIORITY), &["1"]);
        assert_eq!(message.header(&HeaderName::X_PRIORITY), &["1"]);
        assert_eq!(message.header(&HeaderName::X_MSMAIL_PRIORITY), &["1"]);
        assert_eq!(message.header(&HeaderName::ORGANIZATION), &["ACME Inc."]);
        assert_eq!(message.header(&HeaderName::USER_AGENT), &["test suite"]);
        assert_eq!(message.header(&HeaderName::X_MAILER), &["test suite"]);

        let mut normal = Message::new();
        normal.set_importance(Importance::Normal);
        assert!(normal.header(&HeaderName::IMPORTANCE).is_empty());
    }

    #[test]
    fn builder_options() {
        let options = MessageOptions {
            charset: Charset::ISO_8859_1,
            encoding: ContentTransferEncoding::Base64,
            boundary: Some("fixed".into()),
            pgp_type: PgpType::Signature,
            ..MessageOptions::default()
        };
        let mut message = Message::builder().options(options).build();
        assert_eq!(message.charset(), &Charset::ISO_8859_1);
        assert_eq!(message.boundary(), "fixed");
        assert_eq!(message.pgp_type(), PgpType::Signature);

        let part = message.set_body_string(mime::TEXT_PLAIN, "body");
        assert_eq!(part.encoding(), ContentTransferEncoding::Base64);
        assert_eq!(part.charset(), &Charset::ISO_8859_1);
    }

    #[test]
    fn random_boundaries() {
        let first = Message::new();
        let second = Message::new();
        assert_eq!(first.boundary().len(), 40);
        assert!(first.boundary().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first.boundary(), second.boundary());
    }

    #[test]
    fn body_parts() {
        let mut message = Message::new();
        message.set_body_string(mime::TEXT_PLAIN, "plain");
        message
            .add_alternative_string(mime::TEXT_HTML, "<p>html</p>")
            .set_description("HTML");
        assert_eq!(message.parts().len(), 2);
        assert_eq!(message.parts()[1].description(), Some("HTML"));

        message.set_body_string(mime::TEXT_PLAIN, "replaced");
        assert_eq!(message.parts().len(), 1);
        assert_eq!(message.parts()[0].content().unwrap(), b"replaced");

        message.unset_all_parts();
        assert!(message.parts().is_empty());
    }

    #[test]
    fn missing_files() {
        let mut message = Message::new();
        assert!(message.attach_file("/does/not/exist.txt").is_none());
        assert!(message.embed_file("/does/not/exist.png").is_none());
        assert!(message.attachments().is_empty());
        assert!(message.embeds().is_empty());

        let err = message.try_attach_file("/does/not/exist.txt").unwrap_err();
        assert!(matches!(err, Error::File { .. }));
        assert!(err.to_string().starts_with("/does/not/exist.txt: "));
    }

    #[test]
    fn reset_clears_content() {
        let mut message = Message::builder().boundary("kept").build();
        message.set_from("a@domain.tld").unwrap();
        message.set_to(&["b@domain.tld"]).unwrap();
        message.set_subject("Subject");
        message.set_header_preformatted(HeaderName::new("X-Raw").unwrap(), "raw");
        message.set_body_string(mime::TEXT_PLAIN, "body");
        message.attach_bytes("a.txt", b"a".to_vec());
        message.embed_bytes("b.png", b"b".to_vec());
        message.set_send_error(std::io::Error::new(std::io::ErrorKind::Other, "failed"));

        message.reset();
        for kind in AddressKind::ALL.iter() {
            assert!(message.addresses(*kind).is_empty());
        }
        assert!(message.header(&HeaderName::SUBJECT).is_empty());
        assert!(message.header_preformatted(&HeaderName::new("X-Raw").unwrap()).is_none());
        assert!(message.parts().is_empty());
        assert!(message.attachments().is_empty());
        assert!(message.embeds().is_empty());
        assert!(!message.has_send_error());
        assert_eq!(message.boundary(), "kept");
    }
}

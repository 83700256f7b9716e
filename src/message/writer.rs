use std::{
    borrow::Cow,
    io::{self, Write},
};

use crate::message::{
    attachment::Attachment,
    body::{Part, WriteContent},
    encoded_word,
    encoder::EncodingWriter,
    header::{
        format_mailboxes, write_header_line, AddressKind, Charset, ContentTransferEncoding,
        HeaderName,
    },
    structure::Node,
    Message,
};
use crate::Error;

/// Counts written bytes and remembers how the output ends
struct CountingWriter<'a> {
    inner: &'a mut dyn Write,
    count: u64,
    tail: [u8; 2],
}

impl<'a> CountingWriter<'a> {
    fn new(inner: &'a mut dyn Write) -> Self {
        CountingWriter {
            inner,
            count: 0,
            tail: [0; 2],
        }
    }

    fn ends_with_crlf(&self) -> bool {
        &self.tail == b"\r\n"
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.write_all(bytes).map_err(Error::Write)
    }
}

impl Write for CountingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        match written {
            0 => {}
            1 => self.tail = [self.tail[1], buf[0]],
            n => self.tail = [buf[n - 2], buf[n - 1]],
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Serializes a prepared message into `sink`, returning the number of bytes written
pub(crate) fn write_message(message: &Message, sink: &mut dyn Write) -> Result<u64, Error> {
    let root = Node::of(message);
    let mut out = CountingWriter::new(sink);
    write_entity(&mut out, &root, header_block(message), &message.charset)?;
    out.flush().map_err(Error::Write)?;
    Ok(out.count)
}

/// Address headers, generic headers, preformatted headers and `MIME-Version`
fn header_block(message: &Message) -> String {
    let mut out = String::new();
    for kind in AddressKind::ALL.iter().copied().filter(|k| k.is_written()) {
        let mut mailboxes = message.addresses.get(kind);
        if kind == AddressKind::From && mailboxes.is_empty() {
            mailboxes = message.addresses.get(AddressKind::EnvelopeFrom);
        }
        if !mailboxes.is_empty() {
            write_header_line(
                &mut out,
                kind.header_name().as_str(),
                &format_mailboxes(mailboxes, &message.charset),
            );
        }
    }

    out.push_str(&message.headers.to_string());

    for (name, value) in &message.preformatted {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(value);
        out.push_str("\r\n");
    }

    write_header_line(
        &mut out,
        HeaderName::MIME_VERSION.as_str(),
        &message.mime_version.to_string(),
    );
    out
}

fn write_entity(
    out: &mut CountingWriter<'_>,
    node: &Node<'_>,
    mut headers: String,
    charset: &Charset,
) -> Result<(), Error> {
    match node {
        Node::Part(part) => {
            part_headers(&mut headers, part, charset);
            headers.push_str("\r\n");
            out.put(headers.as_bytes())?;
            write_content(out, part.producer(), part.encoding())
        }
        Node::File(file) => {
            file_headers(&mut headers, file, charset);
            headers.push_str("\r\n");
            out.put(headers.as_bytes())?;
            write_content(out, file.producer(), file.encoding())
        }
        Node::Multipart {
            kind,
            boundary,
            children,
        } => {
            write_header_line(
                &mut headers,
                HeaderName::CONTENT_TYPE.as_str(),
                &kind.content_type(boundary),
            );
            headers.push_str("\r\n");
            out.put(headers.as_bytes())?;

            for child in children {
                out.put(format!("--{}\r\n", boundary).as_bytes())?;
                write_entity(out, child, String::new(), charset)?;
            }
            out.put(format!("--{}--\r\n", boundary).as_bytes())
        }
    }
}

fn write_content(
    out: &mut CountingWriter<'_>,
    content: &dyn WriteContent,
    encoding: ContentTransferEncoding,
) -> Result<(), Error> {
    let mut encoder = EncodingWriter::new(&mut *out, encoding);
    if let Err(err) = content.write_content(&mut encoder) {
        return Err(encoder.into_error(err));
    }
    encoder.finish()?;

    if !out.ends_with_crlf() {
        out.put(b"\r\n")?;
    }
    Ok(())
}

fn part_headers(out: &mut String, part: &Part, charset: &Charset) {
    let content_type = part.content_type();
    let mut value = content_type.essence_str().to_owned();
    let is_text = content_type.type_() == mime::TEXT;
    for (name, param) in content_type.params() {
        if !(is_text && name.as_str().eq_ignore_ascii_case("charset")) {
            value.push_str(&format!("; {}={}", name, param_value(param.as_str())));
        }
    }
    if is_text {
        value.push_str("; charset=");
        value.push_str(part.charset().as_str());
    }
    write_header_line(out, HeaderName::CONTENT_TYPE.as_str(), &value);
    write_header_line(
        out,
        HeaderName::CONTENT_TRANSFER_ENCODING.as_str(),
        &part.encoding().to_string(),
    );
    if let Some(description) = part.description() {
        write_header_line(
            out,
            HeaderName::CONTENT_DESCRIPTION.as_str(),
            &encoded_word::encode_q(charset.as_str(), description),
        );
    }
    if let Some(id) = part.content_id() {
        write_header_line(out, HeaderName::CONTENT_ID.as_str(), &angle_id(id));
    }
}

fn file_headers(out: &mut String, file: &Attachment, charset: &Charset) {
    let name = quote(&encoded_word::encode_q(charset.as_str(), file.name()));
    write_header_line(
        out,
        HeaderName::CONTENT_TYPE.as_str(),
        &format!("{}; name={}", file.content_type().essence_str(), name),
    );
    write_header_line(
        out,
        HeaderName::CONTENT_TRANSFER_ENCODING.as_str(),
        &file.encoding().to_string(),
    );
    let disposition = if file.is_inline() { "inline" } else { "attachment" };
    write_header_line(
        out,
        HeaderName::CONTENT_DISPOSITION.as_str(),
        &format!("{}; filename={}", disposition, name),
    );
    if let Some(id) = file.content_id() {
        write_header_line(out, HeaderName::CONTENT_ID.as_str(), &angle_id(id));
    }
    if let Some(description) = file.description() {
        write_header_line(
            out,
            HeaderName::CONTENT_DESCRIPTION.as_str(),
            &encoded_word::encode_q(charset.as_str(), description),
        );
    }
}

fn angle_id(id: &str) -> String {
    format!("<{}>", id.trim_start_matches('<').trim_end_matches('>'))
}

/// A parameter value as written, quoted unless it is a token
fn param_value(value: &str) -> Cow<'_, str> {
    let is_token = !value.is_empty()
        && value
            .bytes()
            .all(|b| b > b' ' && b < 0x7f && !b"()<>@,;:\\\"/[]?=".contains(&b));
    if is_token {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(quote(value))
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

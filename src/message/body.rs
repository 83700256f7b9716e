use std::{
    fmt,
    fs::File,
    io::{self, Read, Seek, SeekFrom, Write},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use mime::Mime;

use crate::message::header::{Charset, ContentTransferEncoding};

/// Producer of the raw content of a part or an attachment
///
/// The producer runs every time the message is serialized, so writing the same content
/// more than once must give the same bytes.
pub trait WriteContent: Send + Sync {
    /// Writes the unencoded content and returns the number of bytes written
    fn write_content(&self, out: &mut dyn Write) -> io::Result<u64>;
}

impl WriteContent for Vec<u8> {
    fn write_content(&self, out: &mut dyn Write) -> io::Result<u64> {
        out.write_all(self)?;
        Ok(self.len() as u64)
    }
}

impl WriteContent for String {
    fn write_content(&self, out: &mut dyn Write) -> io::Result<u64> {
        self.as_bytes().to_vec().write_content(out)
    }
}

impl WriteContent for &'static [u8] {
    fn write_content(&self, out: &mut dyn Write) -> io::Result<u64> {
        out.write_all(self)?;
        Ok(self.len() as u64)
    }
}

/// Content produced by a closure
pub struct FnContent<F>(pub F);

impl<F> WriteContent for FnContent<F>
where
    F: Fn(&mut dyn Write) -> io::Result<u64> + Send + Sync,
{
    fn write_content(&self, out: &mut dyn Write) -> io::Result<u64> {
        (self.0)(out)
    }
}

/// Content read from a seekable source, rewound before every write
pub struct Seekable<R> {
    inner: Mutex<R>,
}

impl<R: Read + Seek + Send> Seekable<R> {
    pub fn new(inner: R) -> Self {
        Seekable {
            inner: Mutex::new(inner),
        }
    }
}

impl<R: Read + Seek + Send> WriteContent for Seekable<R> {
    fn write_content(&self, out: &mut dyn Write) -> io::Result<u64> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "content source is poisoned"))?;
        inner.seek(SeekFrom::Start(0))?;
        io::copy(&mut *inner, out)
    }
}

/// Content of a file, opened again for every write
#[derive(Debug, Clone)]
pub struct FilePath(pub PathBuf);

impl WriteContent for FilePath {
    fn write_content(&self, out: &mut dyn Write) -> io::Result<u64> {
        let mut file = File::open(&self.0)?;
        io::copy(&mut file, out)
    }
}

/// A body part of a message, such as the plain text or the HTML alternative
#[derive(Clone)]
pub struct Part {
    content_type: Mime,
    charset: Charset,
    encoding: ContentTransferEncoding,
    description: Option<String>,
    content_id: Option<String>,
    deleted: bool,
    content: Arc<dyn WriteContent>,
}

impl Part {
    pub fn new(
        content_type: Mime,
        charset: Charset,
        encoding: ContentTransferEncoding,
        content: Arc<dyn WriteContent>,
    ) -> Self {
        Part {
            content_type,
            charset,
            encoding,
            description: None,
            content_id: None,
            deleted: false,
            content,
        }
    }

    pub fn content_type(&self) -> &Mime {
        &self.content_type
    }

    pub fn set_content_type(&mut self, content_type: Mime) -> &mut Self {
        self.content_type = content_type;
        self
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    pub fn set_charset(&mut self, charset: Charset) -> &mut Self {
        self.charset = charset;
        self
    }

    pub fn encoding(&self) -> ContentTransferEncoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: ContentTransferEncoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description<S: Into<String>>(&mut self, description: S) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref()
    }

    pub fn set_content_id<S: Into<String>>(&mut self, content_id: S) -> &mut Self {
        self.content_id = Some(content_id.into());
        self
    }

    /// Replaces the producer of this part
    pub fn set_content<C: WriteContent + 'static>(&mut self, content: C) -> &mut Self {
        self.content = Arc::new(content);
        self
    }

    /// Runs the producer and returns the unencoded content
    pub fn content(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.content.write_content(&mut buf)?;
        Ok(buf)
    }

    /// Excludes the part from serialization, keeping the position of the others
    pub fn delete(&mut self) {
        self.deleted = true;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub(crate) fn producer(&self) -> &dyn WriteContent {
        &*self.content
    }

    pub(crate) fn is_type(&self, content_type: &Mime) -> bool {
        self.content_type.essence_str() == content_type.essence_str()
    }
}

impl fmt::Debug for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Part")
            .field("content_type", &self.content_type)
            .field("charset", &self.charset)
            .field("encoding", &self.encoding)
            .field("description", &self.description)
            .field("content_id", &self.content_id)
            .field("deleted", &self.deleted)
            .finish()
    }
}

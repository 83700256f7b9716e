use std::{
    collections::HashMap,
    fmt,
    hash::BuildHasher,
    io,
    path::Path,
    sync::Arc,
};

use mime::Mime;

use crate::message::{body::WriteContent, header::ContentTransferEncoding};

/// A file attached to or embedded in a message
///
/// Attachments end up in a `multipart/mixed` container, embedded files in a
/// `multipart/related` one next to the body they are referenced from.
#[derive(Clone)]
pub struct Attachment {
    name: String,
    content_type: Option<Mime>,
    description: Option<String>,
    content_id: Option<String>,
    encoding: ContentTransferEncoding,
    inline: bool,
    content: Arc<dyn WriteContent>,
}

impl Attachment {
    /// Creates an attachment named `name`, its content type is guessed from the extension
    /// unless set explicitly
    pub fn new<S: Into<String>>(name: S, content: Arc<dyn WriteContent>) -> Self {
        Attachment {
            name: name.into(),
            content_type: None,
            description: None,
            content_id: None,
            encoding: ContentTransferEncoding::Base64,
            inline: false,
            content,
        }
    }

    pub(crate) fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn content_type(&self) -> Mime {
        match &self.content_type {
            Some(content_type) => content_type.clone(),
            None => mime_guess::from_path(Path::new(&self.name)).first_or_octet_stream(),
        }
    }

    pub fn set_content_type(&mut self, content_type: Mime) -> &mut Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description<S: Into<String>>(&mut self, description: S) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// The `Content-ID`, embedded files fall back to their name
    pub fn content_id(&self) -> Option<&str> {
        match &self.content_id {
            Some(id) => Some(id),
            None if self.inline => Some(&self.name),
            None => None,
        }
    }

    pub fn set_content_id<S: Into<String>>(&mut self, content_id: S) -> &mut Self {
        self.content_id = Some(content_id.into());
        self
    }

    pub fn encoding(&self) -> ContentTransferEncoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: ContentTransferEncoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }

    /// Runs the producer and returns the raw file content
    pub fn content(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.content.write_content(&mut buf)?;
        Ok(buf)
    }

    pub(crate) fn producer(&self) -> &dyn WriteContent {
        &*self.content
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("description", &self.description)
            .field("content_id", &self.content_id)
            .field("encoding", &self.encoding)
            .field("inline", &self.inline)
            .finish()
    }
}

/// Source of named resources that can be attached or embedded
///
/// Typically a table of files compiled into the binary:
///
/// ```
/// use std::collections::HashMap;
/// use missive::message::ResourceProvider;
///
/// let mut assets: HashMap<&'static str, &'static [u8]> = HashMap::new();
/// assets.insert("static/logo.png", b"\x89PNG");
/// assert_eq!(assets.open("static/logo.png").unwrap(), b"\x89PNG");
/// assert!(assets.open("static/missing.png").is_err());
/// ```
pub trait ResourceProvider {
    fn open(&self, path: &str) -> io::Result<Vec<u8>>;
}

impl<S: BuildHasher> ResourceProvider for HashMap<&'static str, &'static [u8], S> {
    fn open(&self, path: &str) -> io::Result<Vec<u8>> {
        self.get(path).map(|data| data.to_vec()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("resource {:?} not found", path),
            )
        })
    }
}

/// Last component of a `/` separated resource path
pub(crate) fn base_name(path: &str) -> &str {
    path.rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(path)
}

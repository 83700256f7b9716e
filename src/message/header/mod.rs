/*!

## Headers widely used in email messages

*/

use std::{
    borrow::Cow,
    cmp::Ordering,
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
    str::FromStr,
};

use crate::Error;

pub use self::{content::*, mailbox::*, special::*};
pub(crate) use self::textual::write_header_line;

mod content;
mod mailbox;
mod special;
mod textual;

/// Name of a header field
///
/// Names compare case-insensitively and are written the way they were created.
#[derive(Debug, Clone)]
pub struct HeaderName(Cow<'static, str>);

impl HeaderName {
    pub const SUBJECT: HeaderName = HeaderName::from_static("Subject");
    pub const DATE: HeaderName = HeaderName::from_static("Date");
    pub const MESSAGE_ID: HeaderName = HeaderName::from_static("Message-ID");
    pub const IN_REPLY_TO: HeaderName = HeaderName::from_static("In-Reply-To");
    pub const REFERENCES: HeaderName = HeaderName::from_static("References");
    pub const COMMENTS: HeaderName = HeaderName::from_static("Comments");
    pub const KEYWORDS: HeaderName = HeaderName::from_static("Keywords");
    pub const ORGANIZATION: HeaderName = HeaderName::from_static("Organization");
    pub const USER_AGENT: HeaderName = HeaderName::from_static("User-Agent");
    pub const X_MAILER: HeaderName = HeaderName::from_static("X-Mailer");
    pub const PRECEDENCE: HeaderName = HeaderName::from_static("Precedence");
    pub const X_AUTO_RESPONSE_SUPPRESS: HeaderName =
        HeaderName::from_static("X-Auto-Response-Suppress");
    pub const IMPORTANCE: HeaderName = HeaderName::from_static("Importance");
    pub const PRIORITY: HeaderName = HeaderName::from_static("Priority");
    pub const X_PRIORITY: HeaderName = HeaderName::from_static("X-Priority");
    pub const X_MSMAIL_PRIORITY: HeaderName = HeaderName::from_static("X-MSMail-Priority");
    pub const CONTENT_LANGUAGE: HeaderName = HeaderName::from_static("Content-Language");
    pub const LIST_UNSUBSCRIBE: HeaderName = HeaderName::from_static("List-Unsubscribe");
    pub const LIST_UNSUBSCRIBE_POST: HeaderName =
        HeaderName::from_static("List-Unsubscribe-Post");
    pub const MIME_VERSION: HeaderName = HeaderName::from_static("MIME-Version");
    pub const CONTENT_TYPE: HeaderName = HeaderName::from_static("Content-Type");
    pub const CONTENT_TRANSFER_ENCODING: HeaderName =
        HeaderName::from_static("Content-Transfer-Encoding");
    pub const CONTENT_DISPOSITION: HeaderName = HeaderName::from_static("Content-Disposition");
    pub const CONTENT_DESCRIPTION: HeaderName = HeaderName::from_static("Content-Description");
    pub const CONTENT_ID: HeaderName = HeaderName::from_static("Content-ID");

    /// Creates a name from a static string without validating it
    pub const fn from_static(name: &'static str) -> Self {
        HeaderName(Cow::Borrowed(name))
    }

    /// Creates a name, checking that it only holds printable ASCII and no colon
    pub fn new<S: Into<String>>(name: S) -> Result<Self, Error> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .bytes()
                .all(|b| (b'!'..=b'~').contains(&b) && b != b':');
        if valid {
            Ok(HeaderName(Cow::Owned(name)))
        } else {
            Err(Error::InvalidHeaderName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for HeaderName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HeaderName::new(s)
    }
}

impl Display for HeaderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HeaderName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for HeaderName {}

impl Ord for HeaderName {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let rhs = other.0.bytes().map(|b| b.to_ascii_lowercase());
        lhs.cmp(rhs)
    }
}

impl PartialOrd for HeaderName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for HeaderName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

/// Generic header fields, each name with its values in insertion order
///
/// Iteration is sorted by name, which is the order the fields are written in.
#[derive(Debug, Clone, Default)]
pub struct Headers(BTreeMap<HeaderName, Vec<String>>);

impl Headers {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, name: &HeaderName) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &HeaderName) -> bool {
        self.0.get(name).map_or(false, |values| !values.is_empty())
    }

    /// Replaces all values of `name`
    pub fn set(&mut self, name: HeaderName, values: Vec<String>) {
        self.0.insert(name, values);
    }

    /// Adds a value after the existing ones
    pub fn append(&mut self, name: HeaderName, value: String) {
        self.0.entry(name).or_insert_with(Vec::new).push(value);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &[String])> {
        self.0
            .iter()
            .map(|(name, values)| (name, values.as_slice()))
    }
}

impl Display for Headers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (name, values) in self.iter() {
            if !values.is_empty() {
                write_header_line(&mut out, name.as_str(), &values.join(", "));
            }
        }
        f.write_str(&out)
    }
}

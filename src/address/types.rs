//! Representation of an email address

use std::{
    convert::TryFrom,
    error::Error,
    ffi::OsStr,
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use once_cell::sync::Lazy;
use regex::Regex;

/// Represents an email address with a user and a domain name.
///
/// This type contains email in canonical form (_user@domain.tld_).
///
/// The local part is either a dot-atom or a single quoted-string, the domain is a dot-atom.
/// Both accept UTF-8 characters outside of the ASCII range. Domain literals such as
/// `[192.0.2.1]` and RFC 822 comments inside the address are rejected, a single trailing
/// comment like `user@domain.tld (Support)` is removed before validation.
///
/// **NOTE**: Enable feature "serde" to be able serialize/deserialize it using [serde](https://serde.rs/).
///
/// # Examples
///
/// You can create an `Address` from a user and a domain:
///
/// ```
/// use missive::Address;
///
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let address = Address::new("user", "email.com")?;
/// # Ok(())
/// # }
/// ```
///
/// You can also create an `Address` from a string literal by parsing it:
///
/// ```
/// use missive::Address;
///
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let address = "user@email.com".parse::<Address>()?;
/// assert_eq!(address.user(), "user");
/// assert_eq!(address.domain(), "email.com");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Address {
    /// Complete address
    serialized: String,
    /// Index into `serialized` before the '@'
    at_start: usize,
}

const ATEXT: &str = r"[A-Za-z0-9!#$%&'*+/=?^_`{|}~\-\x{80}-\x{10FFFF}]";

static DOT_ATOM: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^{a}+(?:\.{a}+)*\z", a = ATEXT)).unwrap());

static QUOTED_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^"(?:[\t \x21\x23-\x5B\x5D-\x7E\x{80}-\x{10FFFF}]|\\[\t\x20-\x7E])*"\z"#)
        .unwrap()
});

impl Address {
    /// Creates a new email address from a user and domain.
    ///
    /// # Examples
    ///
    /// ```
    /// use missive::Address;
    ///
    /// let address = Address::new("user", "email.com");
    /// let expected = "user@email.com".parse::<Address>();
    /// assert_eq!(expected, address);
    /// ```
    pub fn new<U: AsRef<str>, D: AsRef<str>>(user: U, domain: D) -> Result<Self, AddressError> {
        (user, domain).try_into_address()
    }

    /// Gets the user portion of the `Address`.
    pub fn user(&self) -> &str {
        &self.serialized[..self.at_start]
    }

    /// Gets the domain portion of the `Address`.
    pub fn domain(&self) -> &str {
        &self.serialized[self.at_start + 1..]
    }

    pub(super) fn check_user(user: &str) -> Result<(), AddressError> {
        if DOT_ATOM.is_match(user) || QUOTED_STRING.is_match(user) {
            Ok(())
        } else {
            Err(AddressError::InvalidUser)
        }
    }

    pub(super) fn check_domain(domain: &str) -> Result<(), AddressError> {
        if DOT_ATOM.is_match(domain) {
            Ok(())
        } else {
            Err(AddressError::InvalidDomain)
        }
    }
}

/// Removes a trailing `(comment)` from an address or mailbox.
pub(crate) fn strip_comment(val: &str) -> &str {
    let val = val.trim_end();
    if !val.ends_with(')') {
        return val;
    }
    match val.rfind('(') {
        Some(open) => {
            let comment = &val[open + 1..val.len() - 1];
            let head = val[..open].trim_end();
            if head.is_empty() || comment.contains(|c: char| c == '(' || c == ')') {
                val
            } else {
                head
            }
        }
        None => val,
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.serialized)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(val: &str) -> Result<Self, AddressError> {
        let val = strip_comment(val.trim());
        let at_start = val.rfind('@').ok_or(AddressError::MissingParts)?;
        let user = &val[..at_start];
        let domain = &val[at_start + 1..];
        Address::check_user(user)?;
        Address::check_domain(domain)?;
        Ok(Address {
            serialized: val.into(),
            at_start,
        })
    }
}

trait TryIntoAddress {
    fn try_into_address(self) -> Result<Address, AddressError>;
}

impl<U, D> TryIntoAddress for (U, D)
where
    U: AsRef<str>,
    D: AsRef<str>,
{
    fn try_into_address(self) -> Result<Address, AddressError> {
        let user = self.0.as_ref();
        let domain = self.1.as_ref();
        Address::check_user(user)?;
        Address::check_domain(domain)?;

        let serialized = format!("{}@{}", user, domain);
        Ok(Address {
            serialized,
            at_start: user.len(),
        })
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> String {
        address.serialized
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.serialized
    }
}

impl AsRef<OsStr> for Address {
    fn as_ref(&self) -> &OsStr {
        self.serialized.as_ref()
    }
}

/// Errors in email addresses parsing
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AddressError {
    /// Missing domain or user
    MissingParts,
    /// Unbalanced angle bracket
    Unbalanced,
    /// Invalid email user
    InvalidUser,
    /// Invalid email domain
    InvalidDomain,
}

impl Error for AddressError {}

impl Display for AddressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AddressError::MissingParts => f.write_str("Missing domain or user"),
            AddressError::Unbalanced => f.write_str("Unbalanced angle bracket"),
            AddressError::InvalidUser => f.write_str("Invalid email user"),
            AddressError::InvalidDomain => f.write_str("Invalid email domain"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Address, AddressError};

    const RFC5322: &[(&str, bool)] = &[
        ("hi@domain.tld", true),
        ("hi@", false),
        ("hi+there@domain.tld", true),
        ("hi.there@domain.tld", true),
        ("hi.@domain.tld", false),
        ("hi..there@domain.tld", false),
        (r#"!#$%&'(-/=?'@domain.tld"#, false),
        ("hi*there@domain.tld", true),
        ("#$%!^/&@domain.tld", true),
        ("h(a)i@domain.tld", false),
        ("(hi)there@domain.tld", false),
        ("hithere@domain.tld(tld)", true),
        ("hi@there@domain.tld", false),
        (r#""hi@there"@domain.tld"#, true),
        (r#""hi there"@domain.tld"#, true),
        (r#"" "@domain.tld"#, true),
        (r#""<\"@\".!#%$@domain.tld""#, false),
        (r#"<\"@\\".!#%$@domain.tld"#, false),
        (r#"hi"@"there@domain.tld"#, false),
        (r#""<\"@\\".!.#%$@domain.tld"#, false),
        (r#"hi\ there@domain.tld"#, false),
        ("hello@tld", true),
        ("你好@域名.顶级域名", true),
        ("1@23456789", true),
        ("1@[23456789]", false),
    ];

    #[test]
    fn rfc5322_validity() {
        for (candidate, valid) in RFC5322 {
            assert_eq!(
                candidate.parse::<Address>().is_ok(),
                *valid,
                "unexpected result for {}",
                candidate
            );
        }
    }

    #[test]
    fn parts() {
        let address: Address = r#""hi@there"@domain.tld"#.parse().unwrap();
        assert_eq!(address.user(), r#""hi@there""#);
        assert_eq!(address.domain(), "domain.tld");
    }

    #[test]
    fn trailing_comment_is_dropped() {
        let address: Address = "hithere@domain.tld (tld)".parse().unwrap();
        assert_eq!(address.to_string(), "hithere@domain.tld");
    }

    #[test]
    fn new_checks_both_parts() {
        assert_eq!(Address::new("hi..there", "domain.tld"), Err(AddressError::InvalidUser));
        assert_eq!(Address::new("hi", "[127.0.0.1]"), Err(AddressError::InvalidDomain));
        assert_eq!(
            Address::new("hi", "domain.tld").unwrap().to_string(),
            "hi@domain.tld"
        );
    }

    #[test]
    fn missing_at_sign() {
        assert_eq!(
            "domain.tld".parse::<Address>(),
            Err(AddressError::MissingParts)
        );
    }
}

use std::fmt::{self, Display, Formatter};

/// Value of the `MIME-Version` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MimeVersion {
    pub major: u8,
    pub minor: u8,
}

pub const MIME_VERSION_1_0: MimeVersion = MimeVersion { major: 1, minor: 0 };

impl MimeVersion {
    pub fn new(major: u8, minor: u8) -> Self {
        MimeVersion { major, minor }
    }
}

impl Display for MimeVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Default for MimeVersion {
    fn default() -> Self {
        MIME_VERSION_1_0
    }
}

/// Message importance, written as `Importance`, `Priority`, `X-Priority` and
/// `X-MSMail-Priority`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    NonUrgent,
    Low,
    Normal,
    High,
    Urgent,
}

impl Importance {
    /// Value of the `Importance` header
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Importance::NonUrgent => Some("non-urgent"),
            Importance::Low => Some("low"),
            Importance::Normal => None,
            Importance::High => Some("high"),
            Importance::Urgent => Some("urgent"),
        }
    }

    /// Value of the `Priority` and `X-MSMail-Priority` headers
    pub fn num_str(self) -> Option<&'static str> {
        match self {
            Importance::NonUrgent | Importance::Low => Some("0"),
            Importance::Normal => None,
            Importance::High | Importance::Urgent => Some("1"),
        }
    }

    /// Value of the `X-Priority` header
    pub fn x_priority(self) -> Option<&'static str> {
        match self {
            Importance::NonUrgent | Importance::Low => Some("5"),
            Importance::Normal => None,
            Importance::High | Importance::Urgent => Some("1"),
        }
    }
}

impl Default for Importance {
    fn default() -> Self {
        Importance::Normal
    }
}

/// OpenPGP wrapping of the message body (RFC 3156)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PgpType {
    None,
    /// `multipart/signed` with `application/pgp-signature` parts
    Signature,
    /// `multipart/encrypted` with an `application/pgp-encrypted` control part
    Encrypted,
}

impl Default for PgpType {
    fn default() -> Self {
        PgpType::None
    }
}

#[cfg(test)]
mod test {
    use super::{Importance, MimeVersion, MIME_VERSION_1_0};

    #[test]
    fn format_mime_version() {
        assert_eq!(MIME_VERSION_1_0.to_string(), "1.0");
        assert_eq!(MimeVersion::new(0, 1).to_string(), "0.1");
    }

    #[test]
    fn importance_values() {
        let table = [
            (Importance::NonUrgent, Some("non-urgent"), Some("0"), Some("5")),
            (Importance::Low, Some("low"), Some("0"), Some("5")),
            (Importance::Normal, None, None, None),
            (Importance::High, Some("high"), Some("1"), Some("1")),
            (Importance::Urgent, Some("urgent"), Some("1"), Some("1")),
        ];
        for (importance, text, num, x_priority) in table.iter() {
            assert_eq!(importance.as_str(), *text);
            assert_eq!(importance.num_str(), *num);
            assert_eq!(importance.x_priority(), *x_priority);
        }
    }
}

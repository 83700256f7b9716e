use std::{
    borrow::Cow,
    fmt::{Display, Formatter as FmtFormatter, Result as FmtResult},
    str::FromStr,
};

/// `Content-Transfer-Encoding` of a body part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentTransferEncoding {
    #[cfg_attr(feature = "serde", serde(rename = "7bit"))]
    SevenBit,
    #[cfg_attr(feature = "serde", serde(rename = "quoted-printable"))]
    QuotedPrintable,
    #[cfg_attr(feature = "serde", serde(rename = "base64"))]
    Base64,
    // 8BITMIME
    #[cfg_attr(feature = "serde", serde(rename = "8bit"))]
    EightBit,
    #[cfg_attr(feature = "serde", serde(rename = "binary"))]
    Binary,
}

impl Default for ContentTransferEncoding {
    fn default() -> Self {
        ContentTransferEncoding::QuotedPrintable
    }
}

impl Display for ContentTransferEncoding {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        use self::ContentTransferEncoding::*;
        f.write_str(match *self {
            SevenBit => "7bit",
            QuotedPrintable => "quoted-printable",
            Base64 => "base64",
            EightBit => "8bit",
            Binary => "binary",
        })
    }
}

impl FromStr for ContentTransferEncoding {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use self::ContentTransferEncoding::*;
        match s.to_ascii_lowercase().as_str() {
            "7bit" => Ok(SevenBit),
            "quoted-printable" => Ok(QuotedPrintable),
            "base64" => Ok(Base64),
            "8bit" => Ok(EightBit),
            "binary" => Ok(Binary),
            _ => Err(s.into()),
        }
    }
}

/// Character set label used for text parts and encoded header words
///
/// The label is written as given, the content itself is not transcoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Charset(Cow<'static, str>);

impl Charset {
    pub const UTF_8: Charset = Charset::from_static("UTF-8");
    pub const US_ASCII: Charset = Charset::from_static("US-ASCII");
    pub const ISO_8859_1: Charset = Charset::from_static("ISO-8859-1");
    pub const ISO_8859_2: Charset = Charset::from_static("ISO-8859-2");
    pub const ISO_8859_15: Charset = Charset::from_static("ISO-8859-15");
    pub const WINDOWS_1252: Charset = Charset::from_static("windows-1252");
    pub const KOI8_R: Charset = Charset::from_static("KOI8-R");
    pub const ISO_2022_JP: Charset = Charset::from_static("ISO-2022-JP");
    pub const SHIFT_JIS: Charset = Charset::from_static("Shift_JIS");
    pub const EUC_KR: Charset = Charset::from_static("EUC-KR");
    pub const BIG5: Charset = Charset::from_static("Big5");
    pub const GB18030: Charset = Charset::from_static("GB18030");

    pub const fn from_static(name: &'static str) -> Self {
        Charset(Cow::Borrowed(name))
    }

    pub fn new<S: Into<String>>(name: S) -> Self {
        Charset(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Charset {
    fn default() -> Self {
        Charset::UTF_8
    }
}

impl Display for Charset {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Charset {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::{Charset, ContentTransferEncoding};

    #[test]
    fn format_content_transfer_encoding() {
        assert_eq!(ContentTransferEncoding::SevenBit.to_string(), "7bit");
        assert_eq!(ContentTransferEncoding::Base64.to_string(), "base64");
        assert_eq!(
            ContentTransferEncoding::default().to_string(),
            "quoted-printable"
        );
    }

    #[test]
    fn parse_content_transfer_encoding() {
        assert_eq!(
            "7bit".parse::<ContentTransferEncoding>(),
            Ok(ContentTransferEncoding::SevenBit)
        );
        assert_eq!(
            "Base64".parse::<ContentTransferEncoding>(),
            Ok(ContentTransferEncoding::Base64)
        );
        assert!("uuencode".parse::<ContentTransferEncoding>().is_err());
    }

    #[test]
    fn charset_label() {
        assert_eq!(Charset::default().to_string(), "UTF-8");
        assert_eq!(Charset::new("utf-8").as_str(), "utf-8");
        assert_eq!(Charset::ISO_8859_1.as_str(), "ISO-8859-1");
    }
}

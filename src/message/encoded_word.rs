//! RFC 2047 encoded words for header values

/// An encoded word may not be longer than 75 characters
const MAX_ENCODED_WORD_LEN: usize = 75;

/// Room for the encoded text of a word, `=?`, `?q?` and `?=` excluded
fn max_content_len(charset: &str) -> usize {
    MAX_ENCODED_WORD_LEN.saturating_sub("=??q??=".len() + charset.len())
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Whether `text` holds characters that can not appear verbatim in a header
pub fn needs_encoding(text: &str) -> bool {
    text.bytes().any(|b| (b < b' ' || b > b'~') && b != b'\t')
}

/// Encodes `text` with the "Q" encoding
///
/// Text without control or non-ASCII characters is returned unchanged. Longer text is
/// split into several words separated by a single space so that every word stays within
/// 75 characters, never splitting a character across two words.
///
/// ```
/// use missive::message::encoded_word;
///
/// assert_eq!(encoded_word::encode_q("UTF-8", "Hello world!"), "Hello world!");
/// assert_eq!(
///     encoded_word::encode_q("UTF-8", "New Offer 🚀"),
///     "=?UTF-8?q?New_Offer_=F0=9F=9A=80?="
/// );
/// ```
pub fn encode_q(charset: &str, text: &str) -> String {
    if !needs_encoding(text) {
        return text.to_owned();
    }

    let max_len = max_content_len(charset);
    let mut out = String::with_capacity(text.len() * 3);
    open_word(&mut out, charset, 'q');
    let mut current_len = 0;
    let mut buf = [0; 4];
    for c in text.chars() {
        let bytes = c.encode_utf8(&mut buf).as_bytes();
        let encoded_len: usize = bytes.iter().map(|b| q_len(*b)).sum();
        if current_len > 0 && current_len + encoded_len > max_len {
            split_word(&mut out, charset, 'q');
            current_len = 0;
        }
        for b in bytes {
            write_q_byte(&mut out, *b);
        }
        current_len += encoded_len;
    }
    close_word(&mut out);
    out
}

/// Encodes `text` with the "B" encoding, following the same splitting rules as
/// [`encode_q`]
pub fn encode_b(charset: &str, text: &str) -> String {
    if !needs_encoding(text) {
        return text.to_owned();
    }

    let max_len = max_content_len(charset);
    let mut out = String::with_capacity(text.len() * 2);
    open_word(&mut out, charset, 'b');
    if (text.len() + 2) / 3 * 4 <= max_len {
        out.push_str(&base64::encode(text));
        close_word(&mut out);
        return out;
    }

    let mut current_len = 0;
    let mut last = 0;
    for (i, c) in text.char_indices() {
        let len = c.len_utf8();
        if current_len == 0 || current_len + len <= max_len / 4 * 3 {
            current_len += len;
        } else {
            out.push_str(&base64::encode(&text[last..i]));
            split_word(&mut out, charset, 'b');
            last = i;
            current_len = len;
        }
    }
    out.push_str(&base64::encode(&text[last..]));
    close_word(&mut out);
    out
}

fn open_word(out: &mut String, charset: &str, encoding: char) {
    out.push_str("=?");
    out.push_str(charset);
    out.push('?');
    out.push(encoding);
    out.push('?');
}

fn close_word(out: &mut String) {
    out.push_str("?=");
}

fn split_word(out: &mut String, charset: &str, encoding: char) {
    close_word(out);
    out.push(' ');
    open_word(out, charset, encoding);
}

fn q_len(b: u8) -> usize {
    if b >= b' ' && b <= b'~' && b != b'=' && b != b'?' && b != b'_' {
        1
    } else {
        3
    }
}

fn write_q_byte(out: &mut String, b: u8) {
    match b {
        b' ' => out.push('_'),
        b'!'..=b'~' if b != b'=' && b != b'?' && b != b'_' => out.push(b as char),
        _ => {
            out.push('=');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0f) as usize] as char);
        }
    }
}

/// Decodes the encoded words found in a header value
///
/// Whitespace between two adjacent encoded words is dropped. Words with an unknown
/// charset or a malformed payload are kept as they are.
pub fn decode(input: &str) -> String {
    let is_space = |c: char| c == ' ' || c == '\t' || c == '\r' || c == '\n';
    let mut out = String::with_capacity(input.len());
    let mut previous_encoded = false;
    let mut rest = input;
    while !rest.is_empty() {
        let word_start = rest.len() - rest.trim_start_matches(is_space).len();
        let (space, tail) = rest.split_at(word_start);
        let word_end = tail.find(is_space).unwrap_or_else(|| tail.len());
        let (word, next) = tail.split_at(word_end);
        rest = next;

        match decode_word(word) {
            Some(decoded) => {
                if !previous_encoded {
                    out.push_str(space);
                }
                out.push_str(&decoded);
                previous_encoded = true;
            }
            None => {
                out.push_str(space);
                out.push_str(word);
                previous_encoded = false;
            }
        }
    }
    out
}

fn decode_word(word: &str) -> Option<String> {
    let inner = word.strip_prefix("=?")?.strip_suffix("?=")?;
    let mut fields = inner.splitn(3, '?');
    let charset = fields.next()?;
    let encoding = fields.next()?;
    let text = fields.next()?;
    // RFC 2231 language suffix
    let charset = charset.split('*').next().unwrap_or(charset);

    let bytes = match encoding {
        "q" | "Q" => decode_q(text)?,
        "b" | "B" => base64::decode(text).ok()?,
        _ => return None,
    };

    if charset.eq_ignore_ascii_case("UTF-8") || charset.eq_ignore_ascii_case("US-ASCII") {
        String::from_utf8(bytes).ok()
    } else if charset.eq_ignore_ascii_case("ISO-8859-1") {
        Some(bytes.iter().map(|b| *b as char).collect())
    } else {
        None
    }
}

fn decode_q(text: &str) -> Option<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => out.push(b' '),
            b'=' => {
                let hex = text.get(i + 1..i + 3)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 2;
            }
            b => out.push(b),
        }
        i += 1;
    }
    Some(out)
}

#[cfg(test)]
mod test {
    use super::{decode, encode_b, encode_q, needs_encoding};

    const SUBJECTS: &[(&str, &str)] = &[
        ("Hello world!", "Hello world!"),
        ("", ""),
        (
            "Héllô wörld! äöüß",
            "=?UTF-8?q?H=C3=A9ll=C3=B4_w=C3=B6rld!_=C3=A4=C3=B6=C3=BC=C3=9F?=",
        ),
        (
            "これはテスト対象です。",
            "=?UTF-8?q?=E3=81=93=E3=82=8C=E3=81=AF=E3=83=86=E3=82=B9=E3=83=88=E5=AF=BE?= =?UTF-8?q?=E8=B1=A1=E3=81=A7=E3=81=99=E3=80=82?=",
        ),
        (
            "这是一个测试主题",
            "=?UTF-8?q?=E8=BF=99=E6=98=AF=E4=B8=80=E4=B8=AA=E6=B5=8B=E8=AF=95=E4=B8=BB?= =?UTF-8?q?=E9=A2=98?=",
        ),
        (
            "Это испытуемый",
            "=?UTF-8?q?=D0=AD=D1=82=D0=BE_=D0=B8=D1=81=D0=BF=D1=8B=D1=82=D1=83=D0=B5?= =?UTF-8?q?=D0=BC=D1=8B=D0=B9?=",
        ),
        ("New Offer 🚀", "=?UTF-8?q?New_Offer_=F0=9F=9A=80?="),
        ("ab12§$/", "=?UTF-8?q?ab12=C2=A7$/?="),
    ];

    #[test]
    fn q_encoding() {
        for (text, expected) in SUBJECTS {
            assert_eq!(encode_q("UTF-8", text), *expected);
        }
    }

    #[test]
    fn q_round_trip() {
        for (text, _) in SUBJECTS {
            assert_eq!(decode(&encode_q("UTF-8", text)), *text);
        }
    }

    #[test]
    fn words_stay_short() {
        let text = "ü".repeat(100);
        let encoded = encode_q("UTF-8", &text);
        assert!(encoded.split(' ').all(|word| word.len() <= 75));
        assert_eq!(decode(&encoded), text);

        let encoded = encode_b("UTF-8", &text);
        assert!(encoded.split(' ').all(|word| word.len() <= 75));
        assert_eq!(decode(&encoded), text);
    }

    #[test]
    fn other_charsets_are_split() {
        let text = "\u{e9}".repeat(30);
        let encoded = encode_q("ISO-8859-1", &text);
        assert!(encoded.matches("=?ISO-8859-1?q?").count() > 1);
        assert!(encoded.split(' ').all(|word| word.len() <= 75));
        assert_eq!(decode(&encoded.replace("ISO-8859-1", "UTF-8")), text);

        let encoded = encode_b("ISO-8859-1", &text);
        assert!(encoded.matches("=?ISO-8859-1?b?").count() > 1);
        assert!(encoded.split(' ').all(|word| word.len() <= 75));
        assert_eq!(decode(&encoded.replace("ISO-8859-1", "UTF-8")), text);
    }

    #[test]
    fn b_encoding() {
        assert_eq!(encode_b("UTF-8", "Кайо"), "=?UTF-8?b?0JrQsNC50L4=?=");
        assert_eq!(encode_b("UTF-8", "Kayo"), "Kayo");
    }

    #[test]
    fn tab_is_not_encoded() {
        assert!(!needs_encoding("a\tb"));
        assert!(needs_encoding("a\nb"));
    }

    #[test]
    fn decode_mixed() {
        assert_eq!(decode("Re: =?utf-8?b?0KLQtdC80LA=?= now"), "Re: Тема now");
        assert_eq!(decode("=?ISO-8859-1?q?caf=E9?="), "caf\u{e9}");
        assert_eq!(decode("=?x-unknown?q?abc?="), "=?x-unknown?q?abc?=");
    }
}

/// Maximum length of a header line, not counting the CRLF
const MAX_LINE_LENGTH: usize = 76;

/// Writes `name: value` and folds it at spaces so that no line exceeds
/// [`MAX_LINE_LENGTH`] unless a single word is longer than that. The first word
/// moves to a continuation line too when it does not fit after the name.
pub(crate) fn write_header_line(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push(':');
    let mut line_length = name.len() + 1;
    for word in value.split(' ') {
        if line_length > 0 && line_length + 1 + word.len() > MAX_LINE_LENGTH {
            out.push_str("\r\n");
            line_length = 0;
        }
        out.push(' ');
        out.push_str(word);
        line_length += 1 + word.len();
    }
    out.push_str("\r\n");
}

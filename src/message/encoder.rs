use crate::message::header::ContentTransferEncoding;
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    io::{self, Write},
};

/// Content encoding error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderError {
    /// 7bit content with bytes outside of the ASCII range
    NonAscii,
}

impl Error for EncoderError {}

impl Display for EncoderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EncoderError::NonAscii => f.write_str("Non-ASCII content in a 7bit part"),
        }
    }
}

/// Encoder trait
pub trait EncoderCodec: Send {
    /// Encode chunk of data
    fn encode_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>, EncoderError>;

    /// Encode end of stream
    ///
    /// This proposed to use for stateful encoders like *base64*.
    fn finish_chunk(&mut self) -> Result<Vec<u8>, EncoderError> {
        Ok(Vec::new())
    }

    /// Encode all data
    fn encode_all(&mut self, source: &[u8]) -> Result<Vec<u8>, EncoderError> {
        let mut chunk = self.encode_chunk(source)?;
        chunk.extend(self.finish_chunk()?);
        Ok(chunk)
    }
}

/// 7bit codec
///
struct SevenBitCodec {
    line_wrapper: EightBitCodec,
}

impl SevenBitCodec {
    pub fn new() -> Self {
        SevenBitCodec {
            line_wrapper: EightBitCodec::new(),
        }
    }
}

impl EncoderCodec for SevenBitCodec {
    fn encode_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>, EncoderError> {
        if chunk.iter().all(u8::is_ascii) {
            self.line_wrapper.encode_chunk(chunk)
        } else {
            Err(EncoderError::NonAscii)
        }
    }

    fn finish_chunk(&mut self) -> Result<Vec<u8>, EncoderError> {
        self.line_wrapper.finish_chunk()
    }
}

/// Quoted-Printable codec
///
/// Works line by line so that line breaks of the source become CRLF hard breaks.
struct QuotedPrintableCodec {
    line: Vec<u8>,
}

const QP_LINE_LENGTH: usize = 76;

impl QuotedPrintableCodec {
    pub fn new() -> Self {
        QuotedPrintableCodec { line: Vec::new() }
    }

    fn encode_line(line: &[u8], out: &mut Vec<u8>) {
        let mut encoded = quoted_printable::encode(line);
        // whitespace at the end of a line would be dropped by transports
        let last = encoded.last().copied();
        if let Some(last) = last.filter(|b| *b == b' ' || *b == b'\t') {
            encoded.pop();
            let line_start = encoded
                .windows(2)
                .rposition(|w| w == b"\r\n")
                .map_or(0, |pos| pos + 2);
            if encoded.len() - line_start + 3 > QP_LINE_LENGTH {
                encoded.extend_from_slice(b"=\r\n");
            }
            encoded.extend_from_slice(if last == b' ' { b"=20" } else { b"=09" });
        }
        out.extend(encoded);
    }
}

impl EncoderCodec for QuotedPrintableCodec {
    fn encode_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>, EncoderError> {
        let mut out = Vec::with_capacity(chunk.len() * 3 / 2);
        for &b in chunk {
            if b == b'\n' {
                if self.line.last() == Some(&b'\r') {
                    self.line.pop();
                }
                Self::encode_line(&self.line, &mut out);
                out.extend_from_slice(b"\r\n");
                self.line.clear();
            } else {
                self.line.push(b);
            }
        }
        Ok(out)
    }

    fn finish_chunk(&mut self) -> Result<Vec<u8>, EncoderError> {
        let mut out = Vec::new();
        if !self.line.is_empty() {
            Self::encode_line(&self.line, &mut out);
            self.line.clear();
        }
        Ok(out)
    }
}

/// Base64 codec
///
struct Base64Codec {
    line_wrapper: EightBitCodec,
    last_padding: Vec<u8>,
}

impl Base64Codec {
    pub fn new() -> Self {
        Base64Codec {
            line_wrapper: EightBitCodec::new().with_limit(78 - 2),
            last_padding: Vec::with_capacity(3),
        }
    }
}

impl EncoderCodec for Base64Codec {
    fn encode_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>, EncoderError> {
        self.last_padding.extend_from_slice(chunk);
        let len = self.last_padding.len() - (self.last_padding.len() % 3);
        if len == 0 {
            return Ok(Vec::new());
        }

        let encoded = base64::encode(&self.last_padding[..len]);
        // keep the bytes that don't fill a group for the next chunk
        self.last_padding.drain(..len);
        self.line_wrapper.encode_chunk(encoded.as_bytes())
    }

    fn finish_chunk(&mut self) -> Result<Vec<u8>, EncoderError> {
        if self.last_padding.is_empty() {
            return Ok(Vec::new());
        }
        let encoded = base64::encode(&self.last_padding);
        self.last_padding.clear();
        self.line_wrapper.encode_chunk(encoded.as_bytes())
    }
}

/// 8bit codec
///
/// Normalizes line breaks to CRLF and breaks lines longer than the limit.
struct EightBitCodec {
    max_length: usize,
    line_bytes: usize,
    pending_cr: bool,
}

const DEFAULT_MAX_LINE_LENGTH: usize = 1000 - 2;

impl EightBitCodec {
    pub fn new() -> Self {
        EightBitCodec {
            max_length: DEFAULT_MAX_LINE_LENGTH,
            line_bytes: 0,
            pending_cr: false,
        }
    }

    pub fn with_limit(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    fn push(&mut self, b: u8, out: &mut Vec<u8>) {
        if self.line_bytes == self.max_length {
            out.extend_from_slice(b"\r\n");
            self.line_bytes = 0;
        }
        out.push(b);
        self.line_bytes += 1;
    }
}

impl EncoderCodec for EightBitCodec {
    fn encode_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>, EncoderError> {
        let mut out = Vec::with_capacity(chunk.len() + 20);
        for &b in chunk {
            if self.pending_cr {
                self.pending_cr = false;
                if b == b'\n' {
                    out.extend_from_slice(b"\r\n");
                    self.line_bytes = 0;
                    continue;
                }
                self.push(b'\r', &mut out);
            }
            match b {
                b'\r' => self.pending_cr = true,
                b'\n' => {
                    out.extend_from_slice(b"\r\n");
                    self.line_bytes = 0;
                }
                _ => self.push(b, &mut out),
            }
        }
        Ok(out)
    }

    fn finish_chunk(&mut self) -> Result<Vec<u8>, EncoderError> {
        let mut out = Vec::new();
        if self.pending_cr {
            self.pending_cr = false;
            self.push(b'\r', &mut out);
        }
        Ok(out)
    }
}

/// Binary codec
///
struct BinaryCodec;

impl BinaryCodec {
    pub fn new() -> Self {
        BinaryCodec
    }
}

impl EncoderCodec for BinaryCodec {
    fn encode_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>, EncoderError> {
        Ok(chunk.to_vec())
    }
}

pub fn codec(encoding: ContentTransferEncoding) -> Box<dyn EncoderCodec> {
    use self::ContentTransferEncoding::*;
    match encoding {
        SevenBit => Box::new(SevenBitCodec::new()),
        QuotedPrintable => Box::new(QuotedPrintableCodec::new()),
        Base64 => Box::new(Base64Codec::new()),
        EightBit => Box::new(EightBitCodec::new()),
        Binary => Box::new(BinaryCodec::new()),
    }
}

/// Streams content through a codec into a sink
///
/// Failures of the sink are kept apart from failures of the codec, so that the caller
/// can tell whether the producer or the output broke.
pub(crate) struct EncodingWriter<'a> {
    sink: &'a mut dyn Write,
    codec: Box<dyn EncoderCodec>,
    sink_error: Option<io::Error>,
}

impl<'a> EncodingWriter<'a> {
    pub(crate) fn new(sink: &'a mut dyn Write, encoding: ContentTransferEncoding) -> Self {
        EncodingWriter {
            sink,
            codec: codec(encoding),
            sink_error: None,
        }
    }

    fn forward(&mut self, encoded: &[u8]) -> io::Result<()> {
        if let Err(err) = self.sink.write_all(encoded) {
            let kind = err.kind();
            self.sink_error = Some(err);
            return Err(io::Error::new(kind, "output sink failed"));
        }
        Ok(())
    }

    /// Encodes the rest of the stream
    pub(crate) fn finish(mut self) -> Result<(), crate::Error> {
        let result = self
            .codec
            .finish_chunk()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err));
        match result {
            Ok(encoded) => match self.forward(&encoded) {
                Ok(()) => Ok(()),
                Err(err) => Err(self.into_error(err)),
            },
            Err(err) => Err(crate::Error::Content(err)),
        }
    }

    /// Maps a failed content write to the side that caused it
    pub(crate) fn into_error(self, err: io::Error) -> crate::Error {
        match self.sink_error {
            Some(sink_error) => crate::Error::Write(sink_error),
            None => crate::Error::Content(err),
        }
    }
}

impl Write for EncodingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let encoded = self
            .codec
            .encode_chunk(buf)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.forward(&encoded)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

#[cfg(test)]
mod test {
    use super::{
        Base64Codec, BinaryCodec, EightBitCodec, EncoderCodec, EncoderError, EncodingWriter,
        QuotedPrintableCodec, SevenBitCodec,
    };
    use crate::message::header::ContentTransferEncoding;
    use std::io::{self, Write};
    use std::str::from_utf8;

    fn encode_all(codec: &mut dyn EncoderCodec, input: &str) -> String {
        String::from_utf8(codec.encode_all(input.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn seven_bit_encode() {
        let mut c = SevenBitCodec::new();

        assert_eq!(
            c.encode_chunk("Hello, world!".as_bytes())
                .map(|s| from_utf8(&s).map(String::from)),
            Ok(Ok("Hello, world!".into()))
        );

        assert_eq!(
            c.encode_chunk("Hello, мир!".as_bytes()),
            Err(EncoderError::NonAscii)
        );
    }

    #[test]
    fn quoted_printable_encode() {
        let mut c = QuotedPrintableCodec::new();

        assert_eq!(
            encode_all(&mut c, "Привет, мир!"),
            "=D0=9F=D1=80=D0=B8=D0=B2=D0=B5=D1=82, =D0=BC=D0=B8=D1=80!"
        );

        assert_eq!(encode_all(&mut c, "Текст письма в уникоде"),
                   "=D0=A2=D0=B5=D0=BA=D1=81=D1=82 =D0=BF=D0=B8=D1=81=D1=8C=D0=BC=D0=B0 =D0=B2 =\r\n=D1=83=D0=BD=D0=B8=D0=BA=D0=BE=D0=B4=D0=B5");
    }

    #[test]
    fn quoted_printable_line_breaks() {
        let mut c = QuotedPrintableCodec::new();
        assert_eq!(
            encode_all(&mut c, "first\nsecond\r\nthird"),
            "first\r\nsecond\r\nthird"
        );
    }

    #[test]
    fn quoted_printable_trailing_whitespace() {
        let mut c = QuotedPrintableCodec::new();
        assert_eq!(encode_all(&mut c, "end \nend\t\n"), "end=20\r\nend=09\r\n");
    }

    #[test]
    fn quoted_printable_across_chunks() {
        let mut c = QuotedPrintableCodec::new();
        let mut out = c.encode_chunk(b"Hello, ").unwrap();
        out.extend(c.encode_chunk(b"world!\nBye").unwrap());
        out.extend(c.finish_chunk().unwrap());
        assert_eq!(from_utf8(&out).unwrap(), "Hello, world!\r\nBye");
    }

    #[test]
    fn base64_encode() {
        let mut c = Base64Codec::new();

        assert_eq!(
            encode_all(&mut c, "Привет, мир!"),
            "0J/RgNC40LLQtdGCLCDQvNC40YAh"
        );

        let mut c = Base64Codec::new();
        let long = "a".repeat(60);
        assert_eq!(
            encode_all(&mut c, &long),
            format!("{}\r\n{}", "YWFh".repeat(19), "YWFh")
        );
    }

    #[test]
    fn base64_encode_all() {
        let mut c = Base64Codec::new();

        assert_eq!(
            encode_all(
                &mut c,
                "Ну прямо супер-длинный текст письма в уникоде, который уж точно ну никак не поместиться в 78 байт, как ни крути, я гарантирую."
            ),
            concat!("0J3RgyDQv9GA0Y/QvNC+INGB0YPQv9C10YAt0LTQu9C40L3QvdGL0Lkg0YLQtdC60YHRgiDQv9C4\r\n",
                    "0YHRjNC80LAg0LIg0YPQvdC40LrQvtC00LUsINC60L7RgtC+0YDRi9C5INGD0LYg0YLQvtGH0L3Q\r\n",
                    "viDQvdGDINC90LjQutCw0Log0L3QtSDQv9C+0LzQtdGB0YLQuNGC0YzRgdGPINCyIDc4INCx0LDQ\r\n",
                    "udGCLCDQutCw0Log0L3QuCDQutGA0YPRgtC4LCDRjyDQs9Cw0YDQsNC90YLQuNGA0YPRji4=")
        );
    }

    #[test]
    fn base64_encode_chunked() {
        let mut c = Base64Codec::new();
        assert_eq!(c.encode_chunk(b"Chun").unwrap(), b"Q2h1".to_vec());
        assert_eq!(c.encode_chunk(b"k").unwrap(), b"".to_vec());
        assert_eq!(c.finish_chunk().unwrap(), b"bms=".to_vec());
    }

    #[test]
    fn eight_bit_encode() {
        let mut c = EightBitCodec::new();

        assert_eq!(encode_all(&mut c, "Hello, world!"), "Hello, world!");
        assert_eq!(encode_all(&mut c, "Hello, мир!\nline"), "Hello, мир!\r\nline");

        let mut c = EightBitCodec::new().with_limit(4);
        assert_eq!(encode_all(&mut c, "abcdefgh\r\nij"), "abcd\r\nefgh\r\nij");
    }

    #[test]
    fn binary_encode() {
        let mut c = BinaryCodec::new();

        assert_eq!(encode_all(&mut c, "Hello, мир!\n"), "Hello, мир!\n");
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_failures_are_told_apart() {
        let mut sink = BrokenSink;
        let mut writer = EncodingWriter::new(&mut sink, ContentTransferEncoding::Binary);
        let err = writer.write_all(b"data").unwrap_err();
        assert!(matches!(writer.into_error(err), crate::Error::Write(_)));

        let mut sink = Vec::<u8>::new();
        let mut writer = EncodingWriter::new(&mut sink, ContentTransferEncoding::SevenBit);
        let err = writer.write_all("мир".as_bytes()).unwrap_err();
        assert!(matches!(writer.into_error(err), crate::Error::Content(_)));
    }
}

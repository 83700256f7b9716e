use std::io::{self, Read};

use crate::Error;

/// Pull access to a serialized message
///
/// The whole message is rendered up front. When rendering failed the reader holds no
/// bytes, the error is available from [`Reader::error`] and every read fails with it.
#[derive(Debug)]
pub struct Reader {
    buffer: Vec<u8>,
    position: usize,
    error: Option<Error>,
}

impl Reader {
    pub(crate) fn new(rendered: Result<Vec<u8>, Error>) -> Self {
        let mut reader = Reader {
            buffer: Vec::new(),
            position: 0,
            error: None,
        };
        reader.replace(rendered);
        reader
    }

    /// Swaps in a new rendering and rewinds
    pub(crate) fn replace(&mut self, rendered: Result<Vec<u8>, Error>) {
        self.position = 0;
        match rendered {
            Ok(buffer) => {
                self.buffer = buffer;
                self.error = None;
            }
            Err(err) => {
                self.buffer = Vec::new();
                self.error = Some(err);
            }
        }
    }

    /// The error that prevented the message from being rendered
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Size of the rendered message
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Starts reading from the beginning again
    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl Read for Reader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(err) = &self.error {
            return Err(io::Error::new(io::ErrorKind::Other, err.to_string()));
        }

        let remaining = &self.buffer[self.position..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}

#[cfg(test)]
mod test {
    use super::Reader;
    use crate::Error;
    use std::io::{self, Read};

    #[test]
    fn reads_in_chunks() {
        let mut reader = Reader::new(Ok(b"0123456789".to_vec()));
        let mut buf = [0; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"0123");

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"456789");
        assert_eq!(reader.read(&mut buf).unwrap(), 0);

        reader.rewind();
        let mut all = String::new();
        reader.read_to_string(&mut all).unwrap();
        assert_eq!(all, "0123456789");
        assert_eq!(reader.len(), 10);
    }

    #[test]
    fn error_is_kept() {
        let failure = io::Error::new(io::ErrorKind::BrokenPipe, "sink closed");
        let mut reader = Reader::new(Err(Error::Write(failure)));
        assert!(reader.is_empty());
        assert!(matches!(reader.error(), Some(Error::Write(_))));

        let mut buf = [0; 4];
        for _ in 0..2 {
            let err = reader.read(&mut buf).unwrap_err();
            assert_eq!(err.to_string(), "failed to write message: sink closed");
        }
    }

    #[test]
    fn replace_clears_error() {
        let mut reader = Reader::new(Err(Error::NoFromAddress));
        reader.replace(Ok(b"fresh".to_vec()));
        assert!(reader.error().is_none());
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"fresh");
    }
}

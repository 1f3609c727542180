use std::io;

/// Reader decorator that records every byte read through it.
///
/// Wrapping the input in a `TeeReader` lets a metadata scan consume a
/// prefix of a stream that cannot seek, and still hand the complete stream
/// on to a pixel decoder afterwards through [`TeeReader::into_replay`].
#[derive(Debug)]
pub struct TeeReader<R> {
    inner: R,
    recorded: Vec<u8>,
}

impl<R> TeeReader<R> {
    pub fn new(inner: R) -> TeeReader<R> {
        TeeReader {
            inner,
            recorded: Vec::new(),
        }
    }

    /// Bytes read so far.
    pub fn recorded(&self) -> &[u8] {
        &self.recorded
    }
}

impl<R: io::Read> TeeReader<R> {
    /// A reader yielding the recorded bytes, then the rest of the input.
    pub fn into_replay(self) -> Replay<R> {
        Replay {
            inner: io::Read::chain(io::Cursor::new(self.recorded), self.inner),
        }
    }
}

impl<R: io::Read> io::Read for TeeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let length = self.inner.read(buf)?;
        self.recorded.extend_from_slice(&buf[..length]);
        Ok(length)
    }
}

/// The input stream as it was before a metadata scan touched it.
#[derive(Debug)]
pub struct Replay<R> {
    inner: io::Chain<io::Cursor<Vec<u8>>, R>,
}

impl<R> Replay<R> {
    /// Splits into the unread part of the recorded bytes and the original
    /// reader.
    pub fn into_inner(self) -> (io::Cursor<Vec<u8>>, R) {
        self.inner.into_inner()
    }
}

impl<R: io::Read> io::Read for Replay<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Runs a scan over `reader` and returns its result together with a
/// replay of everything the scan consumed followed by the remainder.
pub fn scan_with_replay<R, F, T, E>(reader: R, scan: F) -> (Result<T, E>, Replay<R>)
where
    R: io::Read,
    F: FnOnce(&mut TeeReader<R>) -> Result<T, E>,
{
    let mut tee = TeeReader::new(reader);
    let result = scan(&mut tee);
    (result, tee.into_replay())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_replay_after_partial_read() {
        let input: Vec<u8> = (0..=255).collect();
        let mut tee = TeeReader::new(io::Cursor::new(input.clone()));

        let mut prefix = [0; 10];
        tee.read_exact(&mut prefix).unwrap();
        assert_eq!(tee.recorded(), &input[..10]);

        let mut replayed = Vec::new();
        tee.into_replay().read_to_end(&mut replayed).unwrap();
        assert_eq!(replayed, input);
    }

    #[test]
    fn test_replay_without_read() {
        let input = b"untouched".to_vec();
        let tee = TeeReader::new(io::Cursor::new(input.clone()));

        let mut replayed = Vec::new();
        tee.into_replay().read_to_end(&mut replayed).unwrap();
        assert_eq!(replayed, input);
    }

    #[test]
    fn test_replay_after_failed_scan() {
        let input = b"\x00\x01\x02".to_vec();
        let (result, mut replay) = scan_with_replay(io::Cursor::new(input.clone()), |reader| {
            let mut buffer = [0; 8];
            reader.read_exact(&mut buffer)
        });
        assert_eq!(
            result.unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );

        let mut replayed = Vec::new();
        replay.read_to_end(&mut replayed).unwrap();
        assert_eq!(replayed, input);
    }

    #[test]
    fn test_into_inner() {
        let mut tee = TeeReader::new(io::Cursor::new(b"abcdef".to_vec()));
        let mut prefix = [0; 2];
        tee.read_exact(&mut prefix).unwrap();

        let (recorded, rest) = tee.into_replay().into_inner();
        assert_eq!(recorded.into_inner(), b"ab");
        assert_eq!(rest.position(), 2);
    }
}

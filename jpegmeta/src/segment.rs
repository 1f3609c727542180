use std::io::{self, Read};

use binary::ReadBytesExt;
use log::debug;

use crate::marker::{MarkerType, MARKER_IDENTIFIER};
use crate::Error;

/// A marker and its payload, without the length field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    marker: MarkerType,
    data: Vec<u8>,
}

impl Segment {
    pub fn marker(&self) -> MarkerType {
        self.marker
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Reads the marker segments of a JPEG stream one at a time.
///
/// After a start-of-scan or restart marker the reader is inside
/// entropy-coded data, which carries no segment structure. The next call
/// then skips forward to the following marker. A `0xFF` in entropy-coded
/// data is either stuffed (`FF 00`) or fill (`FF FF`) unless a marker type
/// follows it.
pub struct SegmentReader<R> {
    reader: R,
    in_entropy_coded_data: bool,
}

impl<R: io::Read> SegmentReader<R> {
    pub fn new(reader: R) -> SegmentReader<R> {
        SegmentReader {
            reader,
            in_entropy_coded_data: false,
        }
    }

    pub fn in_entropy_coded_data(&self) -> bool {
        self.in_entropy_coded_data
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    pub fn read_segment(&mut self) -> Result<Segment, Error> {
        let marker = if self.in_entropy_coded_data {
            self.skip_entropy_coded_data()?
        } else {
            let identifier = self.reader.read_u8()?;
            if identifier != MARKER_IDENTIFIER {
                return Err(Error::InvalidMarkerIdentifier { value: identifier });
            }
            MarkerType(self.reader.read_u8()?)
        };

        let segment = self.read_segment_body(marker)?;
        self.in_entropy_coded_data = marker.precedes_entropy_coded_data();
        Ok(segment)
    }

    // Returns the type of the first marker after the entropy-coded data
    fn skip_entropy_coded_data(&mut self) -> Result<MarkerType, Error> {
        let mut skipped: u64 = 0;
        loop {
            if self.reader.read_u8()? != MARKER_IDENTIFIER {
                skipped += 1;
                continue;
            }

            let mut value = self.reader.read_u8()?;
            while value == MARKER_IDENTIFIER {
                value = self.reader.read_u8()?;
            }

            if value == 0x00 {
                skipped += 2;
                continue;
            }

            debug!("Skipped {} bytes of entropy-coded data", skipped);
            return Ok(MarkerType(value));
        }
    }

    fn read_segment_body(&mut self, marker: MarkerType) -> Result<Segment, Error> {
        let has_length = marker
            .has_length()
            .ok_or(Error::UnrecognisedMarker { marker })?;
        if !has_length {
            debug!("{} marker", marker);
            return Ok(Segment {
                marker,
                data: Vec::new(),
            });
        }

        // The length includes the two bytes of the length field
        let length = self.reader.read_u16_be()?;
        if length < 2 {
            return Err(Error::MalformedSegment { marker, length });
        }
        debug!("{} segment of length {}", marker, length);

        let expected = (length - 2) as u64;
        let mut data: Vec<u8> = Vec::new();
        (&mut self.reader).take(expected).read_to_end(&mut data)?;
        if (data.len() as u64) < expected {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        Ok(Segment { marker, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_segments() {
        let data = [
            0xff, 0xd8, // SOI
            0xff, 0xfe, 0x00, 0x05, b'h', b'e', b'y', // COM
            0xff, 0xd9, // EOI
        ];
        let mut reader = SegmentReader::new(Cursor::new(&data[..]));

        let segment = reader.read_segment().unwrap();
        assert_eq!(segment.marker(), MarkerType::START_OF_IMAGE);
        assert!(segment.data().is_empty());

        let segment = reader.read_segment().unwrap();
        assert_eq!(segment.marker(), MarkerType::COMMENT);
        assert_eq!(segment.data(), b"hey");

        let segment = reader.read_segment().unwrap();
        assert_eq!(segment.marker(), MarkerType::END_OF_IMAGE);

        assert!(matches!(
            reader.read_segment(),
            Err(Error::Io(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
    }

    #[test]
    fn test_entropy_coded_data() {
        let data = [
            0xff, 0xda, 0x00, 0x03, 0x01, // SOS
            0x12, 0xff, 0x00, 0x34, 0xff, 0xff, 0xd0, // data, stuffed byte, fill, RST0
            0x56, 0xff, 0x00, 0x78, // data
            0xff, 0xd9, // EOI
        ];
        let mut reader = SegmentReader::new(Cursor::new(&data[..]));

        let segment = reader.read_segment().unwrap();
        assert_eq!(segment.marker(), MarkerType::START_OF_SCAN);
        assert_eq!(segment.data(), &[0x01]);
        assert!(reader.in_entropy_coded_data());

        let segment = reader.read_segment().unwrap();
        assert_eq!(segment.marker(), MarkerType(0xd0));
        assert!(reader.in_entropy_coded_data());

        let segment = reader.read_segment().unwrap();
        assert_eq!(segment.marker(), MarkerType::END_OF_IMAGE);
        assert!(!reader.in_entropy_coded_data());
    }

    #[test]
    fn test_invalid_marker_identifier() {
        let mut reader = SegmentReader::new(Cursor::new(&[0x12, 0xd8][..]));
        let error = reader.read_segment().unwrap_err();
        assert_eq!(error.to_string(), "invalid marker identifier 12");
    }

    #[test]
    fn test_unrecognised_marker() {
        let mut reader = SegmentReader::new(Cursor::new(&[0xff, 0x01][..]));
        let error = reader.read_segment().unwrap_err();
        assert_eq!(error.to_string(), "unrecognised marker type 0x01");
    }

    #[test]
    fn test_malformed_segment() {
        let mut reader = SegmentReader::new(Cursor::new(&[0xff, 0xe0, 0x00, 0x01][..]));
        assert!(matches!(
            reader.read_segment(),
            Err(Error::MalformedSegment { length: 1, .. })
        ));
    }

    #[test]
    fn test_truncated_segment() {
        let mut reader = SegmentReader::new(Cursor::new(&[0xff, 0xe0, 0x00, 0x10, 0x00][..]));
        assert!(matches!(reader.read_segment(), Err(Error::Io(_))));
    }
}

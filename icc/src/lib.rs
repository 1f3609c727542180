//! ICC profile reader.
//!
//! Parses the 128 byte profile header and the tag table, and decodes the
//! profile description tag in both its version 2 (`desc`) and version 4
//! (`mluc`) encodings. Tag data is only interpreted on request.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, Cursor};

use binary::ReadBytesExt;
use log::{debug, warn};
use thiserror::Error;

mod description;
mod header;

pub use description::{
    CountryCode, LanguageCode, LocalizedString, MultiLocalizedUnicode, TextDescription,
    TYPE_MULTI_LOCALIZED_UNICODE, TYPE_TEXT_DESCRIPTION,
};
pub use header::{
    ColorSpace, DateTime, DeviceClass, Header, PrimaryPlatform, RenderingIntent, Version,
    XyzNumber, PROFILE_FILE_SIGNATURE,
};

// desc (0x6465 7363)
pub const TAG_PROFILE_DESCRIPTION: Signature = Signature(*b"desc");

/// A four byte value registered with the ICC, typically printable ASCII.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; 4]);

impl From<[u8; 4]> for Signature {
    fn from(value: [u8; 4]) -> Signature {
        Signature(value)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'")?;
        for &byte in &self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{:02x}", byte)?;
            }
        }
        write!(f, "'")
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid profile file signature {signature}")]
    InvalidProfileFileSignature { signature: Signature },
    #[error("expected tag type {expected} but got {found}")]
    UnexpectedTagType {
        expected: Signature,
        found: Signature,
    },
    #[error("tag {signature} not found")]
    TagMissing { signature: Signature },
    #[error("tag {signature} at offset {offset} with size {size} exceeds profile length {length}")]
    TagOutOfBounds {
        signature: Signature,
        offset: u32,
        size: u32,
        length: usize,
    },
    #[error("record exceeds tag data length")]
    RecordOutOfBounds,
    #[error("unknown profile major version ({major})")]
    UnknownMajorVersion { major: u8 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

// Each tag signature in the tag table must be unique;
// a profile cannot contain more than one tag with the same signature.
#[derive(Clone, Copy, Debug)]
struct Tag {
    signature: [u8; 4],
    offset: [u8; 4], // uInt32Number
    size: [u8; 4],   // uInt32Number
}

impl Tag {
    fn decode<R: io::Read>(reader: &mut R) -> Result<Tag, Error> {
        let mut tag = Tag {
            signature: [0; 4],
            offset: [0; 4],
            size: [0; 4],
        };
        reader.read_exact(&mut tag.signature)?;
        reader.read_exact(&mut tag.offset)?;
        reader.read_exact(&mut tag.size)?;
        Ok(tag)
    }

    // A four byte value registered with the ICC
    fn signature(&self) -> Signature {
        Signature(self.signature)
    }

    // An address within an ICC profile, relative to byte zero of the file.
    fn offset(&self) -> u32 {
        u32::from_be_bytes(self.offset)
    }

    // The number of bytes in the tag data element.
    fn size(&self) -> u32 {
        u32::from_be_bytes(self.size)
    }
}

/// A parsed ICC profile.
///
/// Owns the complete profile bytes. The header and the tag table are decoded
/// up front, tag data is resolved and bounds checked on access.
#[derive(Clone, Debug)]
pub struct Profile {
    header: Header,
    tags: Vec<Tag>,
    data: Vec<u8>,
}

impl Profile {
    pub fn parse(data: Vec<u8>) -> Result<Profile, Error> {
        let mut reader = Cursor::new(data.as_slice());

        let mut header = Header::default();
        header.decode(&mut reader)?;
        debug!(
            "ICC profile version {}, class {}, color space {}",
            header.version(),
            header.device_class(),
            header.data_color_space()
        );

        if header.profile_size() as usize != data.len() {
            debug!(
                "Declared profile size {} differs from actual size {}",
                header.profile_size(),
                data.len()
            );
        }

        let tag_count = reader.read_u32_be()?;

        // The count is untrusted, the table grows as entries are read
        let mut tags: Vec<Tag> = Vec::new();
        let mut seen: HashSet<[u8; 4]> = HashSet::new();
        for _ in 0..tag_count {
            let tag = Tag::decode(&mut reader)?;
            if !seen.insert(tag.signature) {
                warn!("Duplicate tag {}, keeping the first", tag.signature());
                continue;
            }
            tags.push(tag);
        }
        debug!("Tag table holds {} tags", tags.len());

        Ok(Profile { header, tags, data })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The complete profile bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Tag signatures in tag table order.
    pub fn tag_signatures(&self) -> impl Iterator<Item = Signature> + '_ {
        self.tags.iter().map(Tag::signature)
    }

    /// The data element of a tag, or `None` if the profile has no such tag.
    pub fn tag_data(&self, signature: Signature) -> Result<Option<&[u8]>, Error> {
        let tag = match self.tags.iter().find(|t| t.signature() == signature) {
            Some(tag) => tag,
            None => return Ok(None),
        };

        let start = tag.offset() as u64;
        let end = start + tag.size() as u64;
        if end > self.data.len() as u64 {
            return Err(Error::TagOutOfBounds {
                signature,
                offset: tag.offset(),
                size: tag.size(),
                length: self.data.len(),
            });
        }

        Ok(Some(&self.data[start as usize..end as usize]))
    }

    /// The profile description.
    ///
    /// Version 2 profiles carry a textDescriptionType, version 4 profiles a
    /// multiLocalizedUnicodeType. For the latter a non-empty English string
    /// is preferred, then the first string, then the empty string.
    pub fn description(&self) -> Result<String, Error> {
        let data = self
            .tag_data(TAG_PROFILE_DESCRIPTION)?
            .ok_or(Error::TagMissing {
                signature: TAG_PROFILE_DESCRIPTION,
            })?;

        match self.header.version().major {
            2 => Ok(TextDescription::parse(data)?.ascii().to_owned()),
            4 => Ok(MultiLocalizedUnicode::parse(data)?
                .preferred_string()
                .unwrap_or_default()
                .to_owned()),
            major => Err(Error::UnknownMajorVersion { major }),
        }
    }
}

/// Reads a profile from the remainder of the stream.
pub fn decode_icc<R: io::Read>(reader: &mut R) -> Result<Profile, Error> {
    let mut data: Vec<u8> = Vec::new();
    reader.read_to_end(&mut data)?;
    Profile::parse(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_display() {
        assert_eq!(Signature(*b"desc").to_string(), "'desc'");
        assert_eq!(Signature(*b"RGB ").to_string(), "'RGB '");
        assert_eq!(Signature([0x62, 0x00, 0x0a, 0x21]).to_string(), "'b\\x00\\x0a!'");
        assert_eq!(format!("{:?}", Signature(*b"mluc")), "Signature('mluc')");
    }

    #[test]
    fn test_error_display() {
        let error = Error::InvalidProfileFileSignature {
            signature: Signature(*b"bad!"),
        };
        assert_eq!(
            error.to_string(),
            "invalid profile file signature 'bad!'"
        );

        let error = Error::TagMissing {
            signature: TAG_PROFILE_DESCRIPTION,
        };
        assert_eq!(error.to_string(), "tag 'desc' not found");
    }

    #[test]
    fn test_short_profile() {
        let result = Profile::parse(vec![0; 20]);
        assert!(matches!(
            result,
            Err(Error::Io(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
    }
}

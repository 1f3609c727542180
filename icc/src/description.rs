use std::io::{self, Cursor, Read};

use binary::ReadBytesExt;
use log::{debug, warn};

use crate::{Error, Signature};

// desc (0x6465 7363)
pub const TYPE_TEXT_DESCRIPTION: Signature = Signature(*b"desc");

// mluc (0x6D6C 7563)
pub const TYPE_MULTI_LOCALIZED_UNICODE: Signature = Signature(*b"mluc");

pub type LanguageCode = [u8; 2];
pub type CountryCode = [u8; 2];

const LANGUAGE_ENGLISH: LanguageCode = *b"en";
const COUNTRY_UNITED_STATES: CountryCode = *b"US";

// Language code, country code, string length and string offset
const MINIMUM_RECORD_SIZE: u32 = 12;

/// textDescriptionType, the version 2 profile description.
///
/// Only the invariant ASCII description is interpreted, the Unicode and
/// ScriptCode localizations that follow it are ignored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextDescription {
    ascii: String,
}

impl TextDescription {
    pub fn ascii(&self) -> &str {
        &self.ascii
    }

    pub fn parse(data: &[u8]) -> Result<TextDescription, Error> {
        let mut reader = Cursor::new(data);

        let signature = Signature(reader.read_signature()?);
        if signature != TYPE_TEXT_DESCRIPTION {
            return Err(Error::UnexpectedTagType {
                expected: TYPE_TEXT_DESCRIPTION,
                found: signature,
            });
        }

        TextDescription::decode(&mut reader)
    }

    // Decodes the body that follows the type signature
    fn decode<R: io::Read>(reader: &mut R) -> Result<TextDescription, Error> {
        // Reserved, shall be zero
        reader.read_u32_be()?;

        // The count includes the terminating null
        let ascii_count = reader.read_u32_be()?;
        if ascii_count == 0 {
            return Ok(TextDescription::default());
        }

        let expected = ascii_count as u64 - 1;
        let mut ascii: Vec<u8> = Vec::new();
        reader.by_ref().take(expected).read_to_end(&mut ascii)?;
        if (ascii.len() as u64) < expected {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }

        // Terminating null
        reader.read_u8()?;

        Ok(TextDescription {
            ascii: ascii.iter().map(|&byte| byte as char).collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedString {
    pub language: LanguageCode,
    pub country: CountryCode,
    pub text: String,
}

/// multiLocalizedUnicodeType, the version 4 profile description.
///
/// Records are kept in the order they appear in the tag. A record for a
/// language and country pair that is already present replaces the earlier
/// text in place.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MultiLocalizedUnicode {
    records: Vec<LocalizedString>,
}

impl MultiLocalizedUnicode {
    pub fn records(&self) -> &[LocalizedString] {
        &self.records
    }

    pub fn string(&self, language: LanguageCode, country: CountryCode) -> Option<&str> {
        self.records
            .iter()
            .find(|record| record.language == language && record.country == country)
            .map(|record| record.text.as_str())
    }

    pub fn string_for_language(&self, language: LanguageCode) -> Option<&str> {
        self.records
            .iter()
            .find(|record| record.language == language)
            .map(|record| record.text.as_str())
    }

    pub fn any_string(&self) -> Option<&str> {
        self.records.first().map(|record| record.text.as_str())
    }

    /// The English text if there is any, otherwise whichever record comes
    /// first.
    pub fn preferred_string(&self) -> Option<&str> {
        match self.string_for_language(LANGUAGE_ENGLISH) {
            Some(text) if !text.is_empty() => Some(text),
            _ => self.any_string(),
        }
    }

    fn set_string(&mut self, language: LanguageCode, country: CountryCode, text: String) {
        match self
            .records
            .iter_mut()
            .find(|record| record.language == language && record.country == country)
        {
            Some(record) => record.text = text,
            None => self.records.push(LocalizedString {
                language,
                country,
                text,
            }),
        }
    }

    pub fn parse(data: &[u8]) -> Result<MultiLocalizedUnicode, Error> {
        let mut result = MultiLocalizedUnicode::default();
        let mut reader = Cursor::new(data);

        let mut signature = Signature(reader.read_signature()?);

        // Some version 4 profiles lead with a version 2 description so that
        // version 2 readers can still find one. Its ASCII text maps to en-US.
        let mut has_text_description = false;
        let mut structure_start: usize = 0;
        if signature == TYPE_TEXT_DESCRIPTION {
            let description = TextDescription::decode(&mut reader)?;
            debug!("Legacy description {:?} ahead of mluc", description.ascii());
            result.set_string(LANGUAGE_ENGLISH, COUNTRY_UNITED_STATES, description.ascii);
            has_text_description = true;

            structure_start = reader.position() as usize;
            signature = match reader.read_signature() {
                Ok(value) => Signature(value),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(result),
                Err(e) => return Err(e.into()),
            };
        }

        if signature != TYPE_MULTI_LOCALIZED_UNICODE {
            if has_text_description {
                return Ok(result);
            }
            return Err(Error::UnexpectedTagType {
                expected: TYPE_MULTI_LOCALIZED_UNICODE,
                found: signature,
            });
        }

        // Record offsets are relative to the start of the mluc structure
        let structure = &data[structure_start..];

        // Reserved, shall be zero
        reader.read_u32_be()?;

        let record_count = reader.read_u32_be()?;
        let record_size = reader.read_u32_be()?;
        if record_size < MINIMUM_RECORD_SIZE {
            warn!("mluc record size {} is smaller than a record", record_size);
        }

        for _ in 0..record_count {
            let mut language: LanguageCode = [0; 2];
            reader.read_exact(&mut language)?;
            let mut country: CountryCode = [0; 2];
            reader.read_exact(&mut country)?;

            let length = reader.read_u32_be()?;
            let offset = reader.read_u32_be()?;
            if offset as u64 + length as u64 > structure.len() as u64 {
                return Err(Error::RecordOutOfBounds);
            }

            let start = offset as usize;
            let text = decode_utf16_be(&structure[start..start + length as usize]);
            debug!(
                "mluc record {}-{} {:?}",
                String::from_utf8_lossy(&language),
                String::from_utf8_lossy(&country),
                text
            );
            result.set_string(language, country, text);

            if record_size > MINIMUM_RECORD_SIZE {
                reader.skip((record_size - MINIMUM_RECORD_SIZE) as u64)?;
            }
        }

        Ok(result)
    }
}

fn decode_utf16_be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

//! Image metadata for any supported container.
//!
//! The format is detected from the leading bytes of the stream, which are
//! then handed to the matching container reader together with the rest of
//! the stream.

use std::io::{self, Read};

use log::{debug, info};
use thiserror::Error;

pub use meta::{Format, Metadata, ProfileError, Replay};

// RIFF, size and WEBP
const SNIFF_LENGTH: usize = 12;

const JPEG_SIGNATURE: [u8; 2] = [0xff, 0xd8];

#[derive(Debug, Error)]
pub enum Error {
    #[error("unrecognised image format")]
    UnrecognisedFormat,
    #[error(transparent)]
    Jpeg(#[from] jpegmeta::Error),
    #[error(transparent)]
    Png(#[from] pngmeta::Error),
    #[error(transparent)]
    WebP(#[from] webpmeta::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Detects the container format from the leading bytes of a stream.
pub fn detect_format(magic: &[u8]) -> Option<Format> {
    if magic.starts_with(&pngmeta::SIGNATURE) {
        Some(Format::Png)
    } else if magic.starts_with(&JPEG_SIGNATURE) {
        Some(Format::Jpeg)
    } else if magic.len() >= SNIFF_LENGTH
        && magic.starts_with(&webpmeta::RIFF_SIGNATURE)
        && magic[8..12] == webpmeta::WEBP_SIGNATURE
    {
        Some(Format::WebP)
    } else {
        None
    }
}

/// Reads the metadata of a stream in any supported format.
///
/// The first 12 bytes are always consumed to detect the format. A scan that
/// stops within them drops the bytes it did not read, so callers that hand
/// the stream on afterwards should use [`load`].
pub fn read_metadata<R: io::Read>(reader: &mut R) -> Result<Metadata, Error> {
    let mut magic: Vec<u8> = Vec::with_capacity(SNIFF_LENGTH);
    reader
        .by_ref()
        .take(SNIFF_LENGTH as u64)
        .read_to_end(&mut magic)?;
    debug!("Leading bytes {:02x?}", magic);

    let format = detect_format(&magic).ok_or(Error::UnrecognisedFormat)?;
    info!("Detected {} image", format);

    let mut reader = io::Cursor::new(magic).chain(reader);
    let metadata = match format {
        Format::Jpeg => jpegmeta::read_metadata(&mut reader)?,
        Format::Png => pngmeta::read_metadata(&mut reader)?,
        Format::WebP => webpmeta::read_metadata(&mut reader)?,
    };
    Ok(metadata)
}

/// Reads the metadata of a stream in any supported format and returns it
/// with a stream that still yields every byte of the input.
///
/// The stream is returned on failure too, including when the format is not
/// recognised.
pub fn load<R: io::Read>(reader: R) -> (Result<Metadata, Error>, Replay<R>) {
    meta::scan_with_replay(reader, |tee| read_metadata(tee))
}

//! JPEG metadata.
//!
//! Scans the marker segments ahead of the first scan for the frame header
//! and an embedded ICC profile, which may be split across several APP2
//! segments.

use std::io;

use binary::ReadBytesExt;
use log::{debug, info, warn};
use meta::{Format, Metadata, ProfileError, Replay};
use thiserror::Error;

mod chunks;
mod marker;
mod segment;

pub use chunks::IccChunks;
pub use marker::{MarkerType, MARKER_IDENTIFIER};
pub use segment::{Segment, SegmentReader};

// Leads the payload of every APP2 segment carrying an ICC profile chunk
pub const ICC_PROFILE_IDENTIFIER: &[u8; 12] = b"ICC_PROFILE\0";

#[derive(Debug, Error)]
pub enum Error {
    #[error("no metadata found")]
    NoMetadataFound,
    #[error("invalid marker identifier {value:02x}")]
    InvalidMarkerIdentifier { value: u8 },
    #[error("unrecognised marker type {marker}")]
    UnrecognisedMarker { marker: MarkerType },
    #[error("malformed {marker} segment of length {length}")]
    MalformedSegment { marker: MarkerType, length: u16 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// ICC profile chunks that contradict each other.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("inconsistent ICC profile chunk count")]
    InconsistentChunkCount { expected: usize, found: u8 },
    #[error("invalid ICC profile chunk number")]
    InvalidChunkNumber { number: u8, total: u8 },
    #[error("duplicated ICC profile chunk")]
    DuplicatedChunk { number: u8 },
}

#[derive(Debug, Clone, Copy)]
struct FrameHeader {
    bits_per_component: u8,
    height: u16,
    width: u16,
}

impl FrameHeader {
    // Sample precision, number of lines and samples per line
    fn decode(segment: &Segment) -> Result<FrameHeader, Error> {
        let mut data = segment.data();
        if data.len() < 5 {
            return Err(Error::MalformedSegment {
                marker: segment.marker(),
                length: data.len() as u16 + 2,
            });
        }

        Ok(FrameHeader {
            bits_per_component: data.read_u8()?,
            height: data.read_u16_be()?,
            width: data.read_u16_be()?,
        })
    }
}

/// Reads the metadata of a JPEG stream.
///
/// Reading stops at the start of scan, or earlier once the frame header and
/// every chunk of the ICC profile have been seen. Nothing past that point
/// is consumed.
///
/// Contradicting ICC profile chunks do not fail the read. The first such
/// error is kept and returned by the profile accessors of the metadata.
pub fn read_metadata<R: io::Read>(reader: &mut R) -> Result<Metadata, Error> {
    let mut segments = SegmentReader::new(reader);
    let mut frame: Option<FrameHeader> = None;
    let mut chunks = IccChunks::new();
    let mut chunk_error: Option<ChunkError> = None;

    loop {
        let segment = match segments.read_segment() {
            Ok(segment) => segment,
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                if frame.is_none() {
                    return Err(Error::NoMetadataFound);
                }
                info!("End of input before start of scan");
                break;
            }
            Err(e) => return Err(e),
        };

        match segment.marker() {
            marker if marker.is_start_of_frame() => {
                let header = FrameHeader::decode(&segment)?;
                info!(
                    "{} frame {}x{} with {} bits per component",
                    marker, header.width, header.height, header.bits_per_component
                );
                frame = Some(header);
            }
            MarkerType::START_OF_SCAN => {
                info!("Start of scan, stopping");
                break;
            }
            MarkerType::END_OF_IMAGE => {
                info!("End of image before start of scan");
                break;
            }
            MarkerType::APP_2 => {
                let data = segment.data();
                if data.len() < ICC_PROFILE_IDENTIFIER.len() + 2
                    || !data.starts_with(ICC_PROFILE_IDENTIFIER)
                {
                    warn!("Ignoring APP2 segment without an ICC profile");
                    continue;
                }
                if chunk_error.is_some() {
                    continue;
                }

                let number = data[ICC_PROFILE_IDENTIFIER.len()];
                let total = data[ICC_PROFILE_IDENTIFIER.len() + 1];
                let chunk = data[ICC_PROFILE_IDENTIFIER.len() + 2..].to_vec();
                debug!("ICC profile chunk {} of {}, {} bytes", number, total, chunk.len());

                if let Err(e) = chunks.insert(number, total, chunk) {
                    warn!("Discarding ICC profile: {}", e);
                    chunk_error = Some(e);
                }
            }
            _ => {}
        }

        if frame.is_some() && chunk_error.is_none() && chunks.is_complete() {
            info!("All metadata found, stopping");
            break;
        }
    }

    let frame = frame.ok_or(Error::NoMetadataFound)?;
    let metadata = Metadata::new(
        Format::Jpeg,
        frame.width as u32,
        frame.height as u32,
        frame.bits_per_component as u32,
    );

    if let Some(e) = chunk_error {
        return Ok(metadata.with_icc_profile_error(ProfileError::Chunk(Box::new(e))));
    }

    Ok(match chunks.assemble() {
        Some(profile) => metadata.with_icc_profile_data(profile),
        None => metadata,
    })
}

/// Reads the metadata of a JPEG stream and returns it with a stream that
/// still yields every byte of the input.
pub fn load<R: io::Read>(reader: R) -> (Result<Metadata, Error>, Replay<R>) {
    meta::scan_with_replay(reader, |tee| read_metadata(tee))
}

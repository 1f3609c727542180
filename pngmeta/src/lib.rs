//! PNG metadata.
//!
//! Walks the chunk chain up to the first image data chunk, reading the
//! image header and the compressed ICC profile. Chunk CRCs are not checked.

use std::fmt;
use std::io::{self, Read};

use binary::ReadBytesExt;
use flate2::read::ZlibDecoder;
use log::{debug, info};
use meta::{Format, Metadata, ProfileError, Replay};
use thiserror::Error;

// \211 P N G \r \n \032 \n
pub const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

pub const CHUNK_TYPE_IMAGE_HEADER: ChunkType = ChunkType(*b"IHDR");
pub const CHUNK_TYPE_ICC_PROFILE: ChunkType = ChunkType(*b"iCCP");
pub const CHUNK_TYPE_IMAGE_DATA: ChunkType = ChunkType(*b"IDAT");
pub const CHUNK_TYPE_IMAGE_TRAILER: ChunkType = ChunkType(*b"IEND");

const IMAGE_HEADER_LENGTH: u32 = 13;

// 1 to 79 bytes of Latin-1 and a null separator
const MAXIMUM_PROFILE_NAME_LENGTH: usize = 79;

// The only compression method defined for iCCP
const COMPRESSION_METHOD_DEFLATE: u8 = 0;

// Upper bound on the inflated size of an embedded profile
const MAXIMUM_PROFILE_SIZE: u64 = 64 * 1024 * 1024;

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ChunkType({})", self)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid PNG signature")]
    InvalidSignature,
    #[error("no metadata found")]
    NoMetadataFound,
    #[error("unexpected chunk {chunk_type}, expected IHDR")]
    UnexpectedChunk { chunk_type: ChunkType },
    #[error("malformed IHDR chunk of length {length}")]
    MalformedHeader { length: u32 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A malformed iCCP chunk.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("ICC profile name is not terminated within 79 bytes")]
    UnterminatedProfileName,
    #[error("ICC profile inflates to more than {limit} bytes")]
    ProfileTooLarge { limit: u64 },
}

/// Length and type of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub length: u32,
    pub chunk_type: ChunkType,
}

impl ChunkHeader {
    pub fn decode<R: io::Read>(reader: &mut R) -> io::Result<ChunkHeader> {
        let length = reader.read_u32_be()?;
        let chunk_type = ChunkType(reader.read_signature()?);
        Ok(ChunkHeader { length, chunk_type })
    }
}

#[derive(Debug, Clone, Copy)]
struct ImageHeader {
    width: u32,
    height: u32,
    bit_depth: u8,
}

impl ImageHeader {
    fn decode<R: io::Read>(reader: &mut R, length: u32) -> Result<ImageHeader, Error> {
        if length != IMAGE_HEADER_LENGTH {
            return Err(Error::MalformedHeader { length });
        }

        let width = reader.read_u32_be()?;
        let height = reader.read_u32_be()?;
        let bit_depth = reader.read_u8()?;

        // Colour type, compression, filter and interlace methods
        reader.skip(4)?;

        Ok(ImageHeader {
            width,
            height,
            bit_depth,
        })
    }
}

fn read_chunk_data<R: io::Read>(reader: &mut R, length: u32) -> io::Result<Vec<u8>> {
    let mut data: Vec<u8> = Vec::new();
    reader.by_ref().take(length as u64).read_to_end(&mut data)?;
    if data.len() < length as usize {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
    }
    Ok(data)
}

// Running out of input inside a chunk once IHDR is known ends the scan
fn end_of_input<T>(result: io::Result<T>) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            info!("End of input inside a chunk");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Extracts the ICC profile from the data of an iCCP chunk.
///
/// The data is a null-terminated profile name, the compression method and
/// the zlib stream of the profile.
pub fn decode_icc_profile(data: &[u8]) -> Result<Vec<u8>, ProfileError> {
    let name_length = data
        .iter()
        .take(MAXIMUM_PROFILE_NAME_LENGTH + 1)
        .position(|&b| b == 0)
        .ok_or_else(|| ProfileError::Chunk(Box::new(ChunkError::UnterminatedProfileName)))?;
    debug!(
        "ICC profile name {:?}",
        String::from_utf8_lossy(&data[..name_length])
    );

    let mut rest = &data[name_length + 1..];
    let method = rest.read_u8().map_err(ProfileError::Decompression)?;
    if method != COMPRESSION_METHOD_DEFLATE {
        return Err(ProfileError::UnsupportedCompressionMethod { method });
    }

    inflate(rest, MAXIMUM_PROFILE_SIZE)
}

fn inflate(compressed: &[u8], limit: u64) -> Result<Vec<u8>, ProfileError> {
    let mut profile: Vec<u8> = Vec::new();
    ZlibDecoder::new(compressed)
        .take(limit + 1)
        .read_to_end(&mut profile)
        .map_err(ProfileError::Decompression)?;
    if profile.len() as u64 > limit {
        return Err(ProfileError::Chunk(Box::new(ChunkError::ProfileTooLarge {
            limit,
        })));
    }
    Ok(profile)
}

/// Reads the metadata of a PNG stream.
///
/// Reading stops once the ICC profile has been read, or right after the
/// header of the first image data chunk. The data of that chunk is left in
/// the stream.
pub fn read_metadata<R: io::Read>(reader: &mut R) -> Result<Metadata, Error> {
    let mut signature = [0; 8];
    match reader.read_exact(&mut signature) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(Error::InvalidSignature),
        Err(e) => return Err(e.into()),
    }
    if signature != SIGNATURE {
        return Err(Error::InvalidSignature);
    }

    let mut image_header: Option<ImageHeader> = None;
    let mut profile: Option<Result<Vec<u8>, ProfileError>> = None;

    loop {
        let chunk = match ChunkHeader::decode(reader) {
            Ok(chunk) => chunk,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                if image_header.is_none() {
                    return Err(Error::NoMetadataFound);
                }
                info!("End of input before image data");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        debug!("{} chunk of length {}", chunk.chunk_type, chunk.length);

        if image_header.is_none() && chunk.chunk_type != CHUNK_TYPE_IMAGE_HEADER {
            return Err(Error::UnexpectedChunk {
                chunk_type: chunk.chunk_type,
            });
        }

        match chunk.chunk_type {
            CHUNK_TYPE_IMAGE_HEADER => {
                let header = ImageHeader::decode(reader, chunk.length)?;
                info!(
                    "IHDR {}x{} with bit depth {}",
                    header.width, header.height, header.bit_depth
                );
                image_header = Some(header);
                if end_of_input(reader.read_u32_be())?.is_none() {
                    break;
                }
            }
            CHUNK_TYPE_ICC_PROFILE => {
                let Some(data) = end_of_input(read_chunk_data(reader, chunk.length))? else {
                    break;
                };
                profile = Some(decode_icc_profile(&data));
                end_of_input(reader.read_u32_be())?;
                info!("ICC profile read, stopping");
                break;
            }
            CHUNK_TYPE_IMAGE_DATA => {
                info!("IDAT reached, stopping");
                break;
            }
            CHUNK_TYPE_IMAGE_TRAILER => {
                info!("IEND reached, stopping");
                break;
            }
            _ => {
                if end_of_input(reader.skip(chunk.length as u64 + 4))?.is_none() {
                    break;
                }
            }
        }
    }

    let header = image_header.ok_or(Error::NoMetadataFound)?;
    let metadata = Metadata::new(
        Format::Png,
        header.width,
        header.height,
        header.bit_depth as u32,
    );

    Ok(match profile {
        Some(Ok(data)) => metadata.with_icc_profile_data(data),
        Some(Err(e)) => metadata.with_icc_profile_error(e),
        None => metadata,
    })
}

/// Reads the metadata of a PNG stream and returns it with a stream that
/// still yields every byte of the input.
pub fn load<R: io::Read>(reader: R) -> (Result<Metadata, Error>, Replay<R>) {
    meta::scan_with_replay(reader, |tee| read_metadata(tee))
}

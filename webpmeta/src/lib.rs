//! WebP metadata.
//!
//! Walks the RIFF chunks of a WebP file. Simple files carry their
//! dimensions in the `VP8 ` or `VP8L` bitstream header, extended files in
//! the `VP8X` chunk which may be followed by an `ICCP` chunk.

use std::fmt;
use std::io::{self, Read};

use binary::ReadBytesExt;
use log::{debug, info};
use meta::{Format, Metadata, Replay};
use thiserror::Error;

pub const RIFF_SIGNATURE: [u8; 4] = *b"RIFF";
pub const WEBP_SIGNATURE: [u8; 4] = *b"WEBP";

pub const CHUNK_TYPE_VP8: ChunkType = ChunkType(*b"VP8 ");
pub const CHUNK_TYPE_VP8L: ChunkType = ChunkType(*b"VP8L");
pub const CHUNK_TYPE_VP8X: ChunkType = ChunkType(*b"VP8X");
pub const CHUNK_TYPE_ICCP: ChunkType = ChunkType(*b"ICCP");
pub const CHUNK_TYPE_ALPH: ChunkType = ChunkType(*b"ALPH");
pub const CHUNK_TYPE_ANIM: ChunkType = ChunkType(*b"ANIM");
pub const CHUNK_TYPE_ANMF: ChunkType = ChunkType(*b"ANMF");

// Frame tag followed by the start code of a key frame
const VP8_START_CODE: [u8; 3] = [0x9d, 0x01, 0x2a];
const VP8_HEADER_LENGTH: u32 = 10;

const VP8L_SIGNATURE: u8 = 0x2f;
const VP8L_HEADER_LENGTH: u32 = 5;

const VP8X_LENGTH: u32 = 10;
const VP8X_FLAG_ICC_PROFILE: u8 = 0b0010_0000;

// Lossy and lossless bitstreams are 8 bits per component
const BITS_PER_COMPONENT: u32 = 8;

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ChunkType({:?})", String::from_utf8_lossy(&self.0))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing RIFF header")]
    MissingRiffHeader,
    #[error("not a WEBP file")]
    NotWebP,
    #[error("unexpected EOF reading {context}")]
    UnexpectedEof { context: &'static str },
    #[error("invalid VP8 start code")]
    InvalidVp8Signature,
    #[error("invalid VP8L signature")]
    InvalidVp8lSignature,
    #[error("malformed {chunk_type} chunk of size {size}")]
    MalformedChunk { chunk_type: ChunkType, size: u32 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

// Maps end of input to an error naming what was being read
fn read_error(e: io::Error, context: &'static str) -> Error {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::UnexpectedEof { context },
        _ => Error::Io(e),
    }
}

fn is_end_of_input(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::UnexpectedEof
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dimensions {
    width: u32,
    height: u32,
}

// Chunk data is padded to an even size
fn padded(size: u32) -> u64 {
    size as u64 + (size & 1) as u64
}

fn decode_vp8<R: io::Read>(reader: &mut R, size: u32) -> Result<Dimensions, Error> {
    if size < VP8_HEADER_LENGTH {
        return Err(Error::MalformedChunk {
            chunk_type: CHUNK_TYPE_VP8,
            size,
        });
    }

    let mut frame_tag = [0; 3];
    reader.read_exact(&mut frame_tag)?;
    let mut start_code = [0; 3];
    reader.read_exact(&mut start_code)?;
    if start_code != VP8_START_CODE {
        return Err(Error::InvalidVp8Signature);
    }

    // The top two bits of each are a scaling factor
    let width = reader.read_u16_le()? & 0x3fff;
    let height = reader.read_u16_le()? & 0x3fff;

    Ok(Dimensions {
        width: width as u32,
        height: height as u32,
    })
}

fn decode_vp8l<R: io::Read>(reader: &mut R, size: u32) -> Result<Dimensions, Error> {
    if size < VP8L_HEADER_LENGTH {
        return Err(Error::MalformedChunk {
            chunk_type: CHUNK_TYPE_VP8L,
            size,
        });
    }

    if reader.read_u8()? != VP8L_SIGNATURE {
        return Err(Error::InvalidVp8lSignature);
    }

    // 14 bits each of width - 1 and height - 1
    let bits = reader.read_u32_le()?;
    Ok(Dimensions {
        width: (bits & 0x3fff) + 1,
        height: ((bits >> 14) & 0x3fff) + 1,
    })
}

// Returns the canvas size and whether an ICCP chunk follows
fn decode_vp8x<R: io::Read>(reader: &mut R, size: u32) -> Result<(Dimensions, bool), Error> {
    if size < VP8X_LENGTH {
        return Err(Error::MalformedChunk {
            chunk_type: CHUNK_TYPE_VP8X,
            size,
        });
    }

    let flags = reader.read_u8()?;
    reader.skip(3)?;
    let width = reader.read_u24_le()? + 1;
    let height = reader.read_u24_le()? + 1;
    reader.skip(padded(size) - VP8X_LENGTH as u64)?;

    Ok((
        Dimensions { width, height },
        flags & VP8X_FLAG_ICC_PROFILE != 0,
    ))
}

/// Reads the metadata of a WebP stream.
///
/// Of the bitstream chunks only the header bytes holding the dimensions are
/// read. An extended file whose flags announce an ICC profile is read up to
/// and including the `ICCP` chunk.
pub fn read_metadata<R: io::Read>(reader: &mut R) -> Result<Metadata, Error> {
    match reader.read_signature() {
        Ok(signature) if signature == RIFF_SIGNATURE => {}
        Ok(_) => return Err(Error::MissingRiffHeader),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Err(Error::MissingRiffHeader),
        Err(e) => return Err(e.into()),
    }
    let riff_size = reader
        .read_u32_le()
        .map_err(|e| read_error(e, "RIFF size"))?;
    debug!("RIFF size {}", riff_size);

    let signature = reader
        .read_signature()
        .map_err(|e| read_error(e, "WEBP signature"))?;
    if signature != WEBP_SIGNATURE {
        return Err(Error::NotWebP);
    }

    let mut dimensions: Option<Dimensions> = None;
    let mut icc_profile: Option<Vec<u8>> = None;

    loop {
        let chunk_type = match reader.read_signature() {
            Ok(value) => ChunkType(value),
            Err(e) if is_end_of_input(&e) && dimensions.is_some() => {
                info!("End of input before ICCP chunk");
                break;
            }
            Err(e) => return Err(read_error(e, "chunk type")),
        };
        let size = match reader.read_u32_le() {
            Ok(value) => value,
            Err(e) if is_end_of_input(&e) && dimensions.is_some() => {
                info!("End of input inside {} chunk header", chunk_type);
                break;
            }
            Err(e) => return Err(read_error(e, "chunk size")),
        };
        debug!("{} chunk of size {}", chunk_type, size);

        match chunk_type {
            CHUNK_TYPE_VP8 | CHUNK_TYPE_VP8L if dimensions.is_some() => {
                info!("{} bitstream reached, stopping", chunk_type);
                break;
            }
            CHUNK_TYPE_VP8 => {
                dimensions = Some(decode_vp8(reader, size)?);
                break;
            }
            CHUNK_TYPE_VP8L => {
                dimensions = Some(decode_vp8l(reader, size)?);
                break;
            }
            CHUNK_TYPE_VP8X => {
                let (canvas, has_icc_profile) = decode_vp8x(reader, size)?;
                dimensions = Some(canvas);
                if !has_icc_profile || icc_profile.is_some() {
                    break;
                }
            }
            CHUNK_TYPE_ICCP => {
                let mut data: Vec<u8> = Vec::new();
                reader.by_ref().take(size as u64).read_to_end(&mut data)?;
                if data.len() < size as usize {
                    if dimensions.is_some() {
                        info!("End of input inside ICCP chunk");
                        break;
                    }
                    return Err(Error::UnexpectedEof {
                        context: "ICCP chunk",
                    });
                }
                info!("Read {} bytes of ICC profile data", data.len());
                icc_profile = Some(data);
                match reader.skip(padded(size) - size as u64) {
                    Ok(()) => {}
                    Err(e) if is_end_of_input(&e) && dimensions.is_some() => break,
                    Err(e) => return Err(read_error(e, "ICCP chunk")),
                }
                if dimensions.is_some() {
                    break;
                }
            }
            CHUNK_TYPE_ALPH | CHUNK_TYPE_ANIM | CHUNK_TYPE_ANMF if dimensions.is_some() => {
                info!("{} chunk reached, stopping", chunk_type);
                break;
            }
            _ => match reader.skip(padded(size)) {
                Ok(()) => {}
                Err(e) if is_end_of_input(&e) && dimensions.is_some() => {
                    info!("End of input inside {} chunk", chunk_type);
                    break;
                }
                Err(e) => return Err(read_error(e, "chunk data")),
            },
        }
    }

    let dimensions = dimensions.ok_or(Error::UnexpectedEof {
        context: "chunk type",
    })?;
    info!("WebP {}x{}", dimensions.width, dimensions.height);

    let metadata = Metadata::new(
        Format::WebP,
        dimensions.width,
        dimensions.height,
        BITS_PER_COMPONENT,
    );
    Ok(match icc_profile {
        Some(data) => metadata.with_icc_profile_data(data),
        None => metadata,
    })
}

/// Reads the metadata of a WebP stream and returns it with a stream that
/// still yields every byte of the input.
pub fn load<R: io::Read>(reader: R) -> (Result<Metadata, Error>, Replay<R>) {
    meta::scan_with_replay(reader, |tee| read_metadata(tee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_missing_riff_signature() {
        let error = read_metadata(&mut Cursor::new(b"NOT A RIFF SIGNATURE")).unwrap_err();
        assert_eq!(error.to_string(), "missing RIFF header");

        let error = read_metadata(&mut Cursor::new(b"RI")).unwrap_err();
        assert_eq!(error.to_string(), "missing RIFF header");
    }

    #[test]
    fn test_missing_webp_signature() {
        let error = read_metadata(&mut Cursor::new(b"RIFF....NOTP")).unwrap_err();
        assert_eq!(error.to_string(), "not a WEBP file");
    }

    #[test]
    fn test_truncated_chunk_type() {
        let error =
            read_metadata(&mut Cursor::new(b"RIFF\x28\x51\x04\x00WEBPVP8")).unwrap_err();
        assert_eq!(error.to_string(), "unexpected EOF reading chunk type");
    }

    #[test]
    fn test_truncated_chunk_size() {
        let error =
            read_metadata(&mut Cursor::new(b"RIFF\x28\x51\x04\x00WEBPVP8 \x10\x00")).unwrap_err();
        assert_eq!(error.to_string(), "unexpected EOF reading chunk size");
    }

    #[test]
    fn test_extended_without_icc_profile() {
        let data =
            b"RIFF\xc0Z\x04\x00WEBPVP8X\x0a\x00\x00\x00\x14\x00\x00\x00\xaf\x04\x00\xaf\x04\x00";
        let metadata = read_metadata(&mut Cursor::new(data)).unwrap();
        assert_eq!(metadata.format(), Format::WebP);
        assert_eq!(metadata.pixel_width(), 1200);
        assert_eq!(metadata.pixel_height(), 1200);
        assert_eq!(metadata.bits_per_component(), 8);
        assert!(metadata.icc_profile_data().unwrap().is_none());
    }

    #[test]
    fn test_extended_with_icc_profile() {
        let mut data =
            b"RIFF\xc0Z\x04\x00WEBPVP8X\x0a\x00\x00\x00\x34\x00\x00\x00\xaf\x04\x00\xaf\x04\x00"
                .to_vec();
        data.extend_from_slice(b"ICCP");
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 4]);

        let metadata = read_metadata(&mut Cursor::new(data)).unwrap();
        assert_eq!(metadata.pixel_width(), 1200);
        assert_eq!(metadata.pixel_height(), 1200);
        assert_eq!(metadata.icc_profile_data().unwrap(), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_extended_icc_profile_missing() {
        let mut data =
            b"RIFF\x00\x00\x00\x00WEBPVP8X\x0a\x00\x00\x00\x20\x00\x00\x00\x00\x00\x00\x00\x00\x00"
                .to_vec();
        data.extend_from_slice(b"ANIM");
        data.extend_from_slice(&6u32.to_le_bytes());
        data.extend_from_slice(&[0; 6]);

        let metadata = read_metadata(&mut Cursor::new(data)).unwrap();
        assert_eq!(metadata.pixel_width(), 1);
        assert!(metadata.icc_profile_data().unwrap().is_none());
    }

    #[test]
    fn test_truncated_chunk_after_extended_header() {
        let mut data =
            b"RIFF\x00\x00\x00\x00WEBPVP8X\x0a\x00\x00\x00\x20\x00\x00\x00\x01\x00\x00\x02\x00\x00"
                .to_vec();
        data.extend_from_slice(b"EXIF");
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&[0; 10]);

        let metadata = read_metadata(&mut Cursor::new(data)).unwrap();
        assert_eq!(metadata.pixel_width(), 2);
        assert_eq!(metadata.pixel_height(), 3);
        assert!(metadata.icc_profile_data().unwrap().is_none());
    }

    #[test]
    fn test_truncated_icc_profile_chunk() {
        let mut data =
            b"RIFF\x00\x00\x00\x00WEBPVP8X\x0a\x00\x00\x00\x20\x00\x00\x00\x01\x00\x00\x02\x00\x00"
                .to_vec();
        data.extend_from_slice(b"ICCP");
        data.extend_from_slice(&64u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 4]);

        let metadata = read_metadata(&mut Cursor::new(data)).unwrap();
        assert_eq!(metadata.pixel_width(), 2);
        assert!(metadata.icc_profile_data().unwrap().is_none());
    }

    #[test]
    fn test_truncated_icc_profile_before_dimensions() {
        let mut data = b"RIFF\x00\x00\x00\x00WEBPICCP".to_vec();
        data.extend_from_slice(&64u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 4]);

        let error = read_metadata(&mut Cursor::new(data)).unwrap_err();
        assert_eq!(error.to_string(), "unexpected EOF reading ICCP chunk");
    }

    #[test]
    fn test_odd_sized_chunks_are_padded() {
        let mut data =
            b"RIFF\x00\x00\x00\x00WEBPVP8X\x0a\x00\x00\x00\x20\x00\x00\x00\x01\x00\x00\x02\x00\x00"
                .to_vec();
        data.extend_from_slice(b"ICCP");
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&[7, 8, 9, 0]);
        data.extend_from_slice(b"VP8L");

        let mut reader = Cursor::new(data);
        let metadata = read_metadata(&mut reader).unwrap();
        assert_eq!(metadata.pixel_width(), 2);
        assert_eq!(metadata.pixel_height(), 3);
        assert_eq!(metadata.icc_profile_data().unwrap(), Some(&[7u8, 8, 9][..]));

        let mut next = [0; 4];
        reader.read_exact(&mut next).unwrap();
        assert_eq!(&next, b"VP8L");
    }

    #[test]
    fn test_lossy() {
        let mut data = b"RIFF\x00\x00\x00\x00WEBPVP8 ".to_vec();
        data.extend_from_slice(&20u32.to_le_bytes());
        data.extend_from_slice(&[0x50, 0x02, 0x00, 0x9d, 0x01, 0x2a]);
        data.extend_from_slice(&(640u16 | 0x4000).to_le_bytes());
        data.extend_from_slice(&480u16.to_le_bytes());
        data.extend_from_slice(&[0xaa; 10]);

        let mut reader = Cursor::new(data);
        let metadata = read_metadata(&mut reader).unwrap();
        assert_eq!(metadata.pixel_width(), 640);
        assert_eq!(metadata.pixel_height(), 480);
        assert_eq!(reader.position(), 30);
    }

    #[test]
    fn test_lossy_invalid_start_code() {
        let mut data = b"RIFF\x00\x00\x00\x00WEBPVP8 ".to_vec();
        data.extend_from_slice(&10u32.to_le_bytes());
        data.extend_from_slice(&[0x50, 0x02, 0x00, 0x9d, 0x01, 0x2b, 0, 0, 0, 0]);
        let error = read_metadata(&mut Cursor::new(data)).unwrap_err();
        assert_eq!(error.to_string(), "invalid VP8 start code");
    }

    #[test]
    fn test_lossless() {
        // 8 x 4
        let bits: u32 = 7 | (3 << 14);
        let mut data = b"RIFF\x00\x00\x00\x00WEBPVP8L".to_vec();
        data.extend_from_slice(&9u32.to_le_bytes());
        data.push(0x2f);
        data.extend_from_slice(&bits.to_le_bytes());
        data.extend_from_slice(&[0; 5]);

        let metadata = read_metadata(&mut Cursor::new(data)).unwrap();
        assert_eq!(metadata.pixel_width(), 8);
        assert_eq!(metadata.pixel_height(), 4);
        assert_eq!(metadata.bits_per_component(), 8);
    }

    #[test]
    fn test_lossless_invalid_signature() {
        let mut data = b"RIFF\x00\x00\x00\x00WEBPVP8L".to_vec();
        data.extend_from_slice(&5u32.to_le_bytes());
        data.extend_from_slice(&[0x2e, 0, 0, 0, 0]);
        assert!(matches!(
            read_metadata(&mut Cursor::new(data)),
            Err(Error::InvalidVp8lSignature)
        ));
    }

    #[test]
    fn test_malformed_extended_chunk() {
        let mut data = b"RIFF\x00\x00\x00\x00WEBPVP8X".to_vec();
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        let error = read_metadata(&mut Cursor::new(data)).unwrap_err();
        assert_eq!(error.to_string(), "malformed VP8X chunk of size 4");
    }

    #[test]
    fn test_unknown_chunks_are_skipped() {
        let mut data = b"RIFF\x00\x00\x00\x00WEBPJUNK".to_vec();
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 0]);
        data.extend_from_slice(b"VP8L");
        data.extend_from_slice(&5u32.to_le_bytes());
        data.push(0x2f);
        data.extend_from_slice(&0u32.to_le_bytes());

        let metadata = read_metadata(&mut Cursor::new(data)).unwrap();
        assert_eq!(metadata.pixel_width(), 1);
        assert_eq!(metadata.pixel_height(), 1);
    }
}

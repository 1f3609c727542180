//! Image metadata shared by the container readers.

use std::error;
use std::fmt;
use std::io;
use std::sync::OnceLock;

use log::debug;
use thiserror::Error;

mod replay;

pub use replay::{scan_with_replay, Replay, TeeReader};

/// Container family an image was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Jpeg,
    Png,
    WebP,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Jpeg => write!(f, "JPEG"),
            Self::Png => write!(f, "PNG"),
            Self::WebP => write!(f, "WebP"),
        }
    }
}

/// Error concerning the embedded colour profile.
///
/// These never fail a metadata scan. They are kept on the [`Metadata`] and
/// returned when the profile is requested.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("ICC profile decompression failed: {0}")]
    Decompression(io::Error),
    #[error("unsupported ICC profile compression method {method}")]
    UnsupportedCompressionMethod { method: u8 },
    /// The container chunks holding the profile are malformed or contradict
    /// each other.
    #[error(transparent)]
    Chunk(Box<dyn error::Error + Send + Sync>),
    #[error(transparent)]
    Profile(#[from] icc::Error),
}

/// Metadata of a single image.
///
/// Built by a container reader once scanning has finished. The profile
/// bytes, or the error that prevented them from being extracted, are fixed
/// at that point; the parsed profile is computed on first request and
/// cached.
#[derive(Debug)]
pub struct Metadata {
    format: Format,
    pixel_width: u32,
    pixel_height: u32,
    bits_per_component: u32,
    icc_profile_data: Result<Option<Vec<u8>>, ProfileError>,
    icc_profile: OnceLock<Result<icc::Profile, ProfileError>>,
}

impl Metadata {
    pub fn new(
        format: Format,
        pixel_width: u32,
        pixel_height: u32,
        bits_per_component: u32,
    ) -> Metadata {
        Metadata {
            format,
            pixel_width,
            pixel_height,
            bits_per_component,
            icc_profile_data: Ok(None),
            icc_profile: OnceLock::new(),
        }
    }

    pub fn with_icc_profile_data(mut self, data: Vec<u8>) -> Metadata {
        self.icc_profile_data = Ok(Some(data));
        self.icc_profile = OnceLock::new();
        self
    }

    pub fn with_icc_profile_error(mut self, error: ProfileError) -> Metadata {
        self.icc_profile_data = Err(error);
        self.icc_profile = OnceLock::new();
        self
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    pub fn bits_per_component(&self) -> u32 {
        self.bits_per_component
    }

    /// The embedded profile bytes, unparsed.
    ///
    /// `Ok(None)` when the image carries no profile.
    pub fn icc_profile_data(&self) -> Result<Option<&[u8]>, &ProfileError> {
        match &self.icc_profile_data {
            Ok(data) => Ok(data.as_deref()),
            Err(e) => Err(e),
        }
    }

    /// The embedded profile, parsed on first call.
    ///
    /// Later calls return the cached outcome, including a cached error.
    pub fn icc_profile(&self) -> Result<Option<&icc::Profile>, &ProfileError> {
        let data = match self.icc_profile_data()? {
            Some(data) => data,
            None => return Ok(None),
        };

        let result = self.icc_profile.get_or_init(|| {
            debug!("Parsing {} bytes of ICC profile data", data.len());
            icc::Profile::parse(data.to_vec()).map_err(ProfileError::from)
        });

        match result {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => Err(e),
        }
    }
}

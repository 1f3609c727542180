use std::fmt;
use std::io;

use crate::{Error, Signature};

// acsp (0x6163 7370)
pub const PROFILE_FILE_SIGNATURE: Signature = Signature(*b"acsp");

const DEVICE_CLASS_INPUT: Signature = Signature(*b"scnr");
const DEVICE_CLASS_DISPLAY: Signature = Signature(*b"mntr");
const DEVICE_CLASS_OUTPUT: Signature = Signature(*b"prtr");
const DEVICE_CLASS_DEVICE_LINK: Signature = Signature(*b"link");
const DEVICE_CLASS_COLOR_SPACE: Signature = Signature(*b"spac");
const DEVICE_CLASS_ABSTRACT: Signature = Signature(*b"abst");
const DEVICE_CLASS_NAMED_COLOR: Signature = Signature(*b"nmcl");

const COLOR_SPACE_XYZ: Signature = Signature(*b"XYZ ");
const COLOR_SPACE_LAB: Signature = Signature(*b"Lab ");
const COLOR_SPACE_LUV: Signature = Signature(*b"Luv ");
const COLOR_SPACE_YCBCR: Signature = Signature(*b"YCbr");
const COLOR_SPACE_YXY: Signature = Signature(*b"Yxy ");
const COLOR_SPACE_RGB: Signature = Signature(*b"RGB ");
const COLOR_SPACE_GRAY: Signature = Signature(*b"GRAY");
const COLOR_SPACE_HSV: Signature = Signature(*b"HSV ");
const COLOR_SPACE_HLS: Signature = Signature(*b"HLS ");
const COLOR_SPACE_CMYK: Signature = Signature(*b"CMYK");
const COLOR_SPACE_CMY: Signature = Signature(*b"CMY ");

const PLATFORM_APPLE: Signature = Signature(*b"APPL");
const PLATFORM_MICROSOFT: Signature = Signature(*b"MSFT");
const PLATFORM_SILICON_GRAPHICS: Signature = Signature(*b"SGI ");
const PLATFORM_SUN: Signature = Signature(*b"SUNW");
const PLATFORM_UNSPECIFIED: Signature = Signature([0; 4]);

const FLAG_EMBEDDED: u32 = 0b01;
const FLAG_DEPENDS_ON_EMBEDDED_DATA: u32 = 0b10;

/// Profile version.
///
/// Byte zero is the major revision and byte one holds the minor revision in
/// its high nibble and the bug fix revision in its low nibble. Bytes two and
/// three are reserved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub bugfix: u8,
}

impl Version {
    fn new(value: [u8; 4]) -> Version {
        Version {
            major: value[0],
            minor: value[1] >> 4,
            bugfix: value[1] & 0x0f,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.bugfix)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
    Input,
    Display,
    Output,
    DeviceLink,
    ColorSpace,
    Abstract,
    NamedColor,
    Unknown { value: Signature },
}

impl DeviceClass {
    fn new(value: Signature) -> DeviceClass {
        match value {
            DEVICE_CLASS_INPUT => DeviceClass::Input,
            DEVICE_CLASS_DISPLAY => DeviceClass::Display,
            DEVICE_CLASS_OUTPUT => DeviceClass::Output,
            DEVICE_CLASS_DEVICE_LINK => DeviceClass::DeviceLink,
            DEVICE_CLASS_COLOR_SPACE => DeviceClass::ColorSpace,
            DEVICE_CLASS_ABSTRACT => DeviceClass::Abstract,
            DEVICE_CLASS_NAMED_COLOR => DeviceClass::NamedColor,
            value => DeviceClass::Unknown { value },
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Input => write!(f, "Input"),
            Self::Display => write!(f, "Display"),
            Self::Output => write!(f, "Output"),
            Self::DeviceLink => write!(f, "DeviceLink"),
            Self::ColorSpace => write!(f, "ColorSpace"),
            Self::Abstract => write!(f, "Abstract"),
            Self::NamedColor => write!(f, "NamedColor"),
            Self::Unknown { value } => write!(f, "Unknown {}", value),
        }
    }
}

/// Colour space signatures, used for both the data colour space and the
/// profile connection space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Xyz,
    Lab,
    Luv,
    YCbCr,
    Yxy,
    Rgb,
    Gray,
    Hsv,
    Hls,
    Cmyk,
    Cmy,
    Unknown { value: Signature },
}

impl ColorSpace {
    fn new(value: Signature) -> ColorSpace {
        match value {
            COLOR_SPACE_XYZ => ColorSpace::Xyz,
            COLOR_SPACE_LAB => ColorSpace::Lab,
            COLOR_SPACE_LUV => ColorSpace::Luv,
            COLOR_SPACE_YCBCR => ColorSpace::YCbCr,
            COLOR_SPACE_YXY => ColorSpace::Yxy,
            COLOR_SPACE_RGB => ColorSpace::Rgb,
            COLOR_SPACE_GRAY => ColorSpace::Gray,
            COLOR_SPACE_HSV => ColorSpace::Hsv,
            COLOR_SPACE_HLS => ColorSpace::Hls,
            COLOR_SPACE_CMYK => ColorSpace::Cmyk,
            COLOR_SPACE_CMY => ColorSpace::Cmy,
            _ => ColorSpace::Unknown { value },
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Xyz => write!(f, "XYZ"),
            Self::Lab => write!(f, "Lab"),
            Self::Luv => write!(f, "Luv"),
            Self::YCbCr => write!(f, "YCbCr"),
            Self::Yxy => write!(f, "Yxy"),
            Self::Rgb => write!(f, "RGB"),
            Self::Gray => write!(f, "Gray"),
            Self::Hsv => write!(f, "HSV"),
            Self::Hls => write!(f, "HLS"),
            Self::Cmyk => write!(f, "CMYK"),
            Self::Cmy => write!(f, "CMY"),
            Self::Unknown { value } => write!(f, "Unknown {}", value),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimaryPlatform {
    Apple,
    Microsoft,
    SiliconGraphics,
    SunMicrosystems,
    Unspecified,
    Unknown { value: Signature },
}

impl PrimaryPlatform {
    fn new(value: Signature) -> PrimaryPlatform {
        match value {
            PLATFORM_APPLE => PrimaryPlatform::Apple,
            PLATFORM_MICROSOFT => PrimaryPlatform::Microsoft,
            PLATFORM_SILICON_GRAPHICS => PrimaryPlatform::SiliconGraphics,
            PLATFORM_SUN => PrimaryPlatform::SunMicrosystems,
            PLATFORM_UNSPECIFIED => PrimaryPlatform::Unspecified,
            value => PrimaryPlatform::Unknown { value },
        }
    }
}

impl fmt::Display for PrimaryPlatform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Apple => write!(f, "Apple Computer, Inc."),
            Self::Microsoft => write!(f, "Microsoft Corporation"),
            Self::SiliconGraphics => write!(f, "Silicon Graphics, Inc."),
            Self::SunMicrosystems => write!(f, "Sun Microsystems, Inc."),
            Self::Unspecified => write!(f, "Unspecified"),
            Self::Unknown { value } => write!(f, "Unknown {}", value),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderingIntent {
    Perceptual,
    RelativeColorimetric,
    Saturation,
    AbsoluteColorimetric,
    Reserved { value: u32 },
}

impl RenderingIntent {
    fn new(value: u32) -> RenderingIntent {
        // Only the low 16 bits are significant, the high 16 bits shall be zero
        match value & 0xffff {
            0 => RenderingIntent::Perceptual,
            1 => RenderingIntent::RelativeColorimetric,
            2 => RenderingIntent::Saturation,
            3 => RenderingIntent::AbsoluteColorimetric,
            _ => RenderingIntent::Reserved { value },
        }
    }
}

impl fmt::Display for RenderingIntent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Perceptual => write!(f, "Perceptual"),
            Self::RelativeColorimetric => write!(f, "Relative Colorimetric"),
            Self::Saturation => write!(f, "Saturation"),
            Self::AbsoluteColorimetric => write!(f, "Absolute Colorimetric"),
            Self::Reserved { value } => write!(f, "Reserved ({})", value),
        }
    }
}

/// dateTimeNumber, six big endian 16 bit fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hours: u16,
    pub minutes: u16,
    pub seconds: u16,
}

impl DateTime {
    fn new(value: [u8; 12]) -> DateTime {
        let field = |index: usize| u16::from_be_bytes([value[index * 2], value[index * 2 + 1]]);
        DateTime {
            year: field(0),
            month: field(1),
            day: field(2),
            hours: field(3),
            minutes: field(4),
            seconds: field(5),
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hours, self.minutes, self.seconds
        )
    }
}

/// XYZNumber, three s15Fixed16Number values kept in their raw encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct XyzNumber {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl XyzNumber {
    fn new(value: [u8; 12]) -> XyzNumber {
        let field = |index: usize| {
            i32::from_be_bytes([
                value[index * 4],
                value[index * 4 + 1],
                value[index * 4 + 2],
                value[index * 4 + 3],
            ])
        };
        XyzNumber {
            x: field(0),
            y: field(1),
            z: field(2),
        }
    }

    pub fn to_f64(&self) -> [f64; 3] {
        [
            self.x as f64 / 65536.0,
            self.y as f64 / 65536.0,
            self.z as f64 / 65536.0,
        ]
    }
}

/// Profile header.
///
/// The profile header is 128 bytes in length and contains 18 fields. Fields
/// are kept in their encoded form and decoded on access.
#[derive(Clone, Debug, Default)]
pub struct Header {
    profile_size: [u8; 4],
    preferred_cmm: [u8; 4],
    version: [u8; 4],
    device_class: [u8; 4],
    data_color_space: [u8; 4],
    profile_connection_space: [u8; 4],
    created_at: [u8; 12],
    profile_file_signature: [u8; 4],
    primary_platform: [u8; 4],
    flags: [u8; 4],
    device_manufacturer: [u8; 4],
    device_model: [u8; 4],
    device_attributes: [u8; 8],
    rendering_intent: [u8; 4],
    pcs_illuminant: [u8; 12],
    profile_creator: [u8; 4],
    profile_id: [u8; 16],
    reserved: [u8; 28],
}

impl Header {
    /// Profile size.
    ///
    /// The total size of the profile in bytes, as declared by the profile.
    pub fn profile_size(&self) -> u32 {
        u32::from_be_bytes(self.profile_size)
    }

    /// Preferred CMM type.
    pub fn preferred_cmm(&self) -> Signature {
        Signature(self.preferred_cmm)
    }

    pub fn version(&self) -> Version {
        Version::new(self.version)
    }

    pub fn device_class(&self) -> DeviceClass {
        DeviceClass::new(Signature(self.device_class))
    }

    pub fn data_color_space(&self) -> ColorSpace {
        ColorSpace::new(Signature(self.data_color_space))
    }

    /// Profile connection space.
    ///
    /// Either XYZ or Lab, except for device link profiles where it is the
    /// colour space of the output device.
    pub fn profile_connection_space(&self) -> ColorSpace {
        ColorSpace::new(Signature(self.profile_connection_space))
    }

    pub fn created_at(&self) -> DateTime {
        DateTime::new(self.created_at)
    }

    pub fn profile_file_signature(&self) -> Signature {
        Signature(self.profile_file_signature)
    }

    pub fn primary_platform(&self) -> PrimaryPlatform {
        PrimaryPlatform::new(Signature(self.primary_platform))
    }

    pub fn flags(&self) -> u32 {
        u32::from_be_bytes(self.flags)
    }

    /// Whether the profile is embedded in a file.
    pub fn embedded(&self) -> bool {
        self.flags() & FLAG_EMBEDDED != 0
    }

    /// Whether the profile cannot be used independently of the embedded colour
    /// data.
    pub fn depends_on_embedded_data(&self) -> bool {
        self.flags() & FLAG_DEPENDS_ON_EMBEDDED_DATA != 0
    }

    pub fn device_manufacturer(&self) -> Signature {
        Signature(self.device_manufacturer)
    }

    pub fn device_model(&self) -> Signature {
        Signature(self.device_model)
    }

    // Device attributes.
    //
    // The least significant 32 bits are reserved for the ICC. Bit 0 is
    // reflective (0) or transparency (1), bit 1 glossy (0) or matte (1), bit 2
    // positive (0) or negative (1) media polarity and bit 3 colour (0) or
    // black and white (1) media.
    pub fn device_attributes(&self) -> u64 {
        u64::from_be_bytes(self.device_attributes)
    }

    pub fn rendering_intent(&self) -> RenderingIntent {
        RenderingIntent::new(u32::from_be_bytes(self.rendering_intent))
    }

    /// The nCIEXYZ values of the illuminant of the profile connection space.
    pub fn pcs_illuminant(&self) -> XyzNumber {
        XyzNumber::new(self.pcs_illuminant)
    }

    pub fn profile_creator(&self) -> Signature {
        Signature(self.profile_creator)
    }

    /// Profile ID.
    ///
    /// An MD5 fingerprint of the profile, or all zeroes when it has not been
    /// calculated.
    pub fn profile_id(&self) -> [u8; 16] {
        self.profile_id
    }

    pub(crate) fn decode<R: io::Read>(&mut self, reader: &mut R) -> Result<(), Error> {
        reader.read_exact(&mut self.profile_size)?;
        reader.read_exact(&mut self.preferred_cmm)?;
        reader.read_exact(&mut self.version)?;
        reader.read_exact(&mut self.device_class)?;
        reader.read_exact(&mut self.data_color_space)?;
        reader.read_exact(&mut self.profile_connection_space)?;
        reader.read_exact(&mut self.created_at)?;
        reader.read_exact(&mut self.profile_file_signature)?;

        if self.profile_file_signature() != PROFILE_FILE_SIGNATURE {
            return Err(Error::InvalidProfileFileSignature {
                signature: self.profile_file_signature(),
            });
        }

        reader.read_exact(&mut self.primary_platform)?;
        reader.read_exact(&mut self.flags)?;
        reader.read_exact(&mut self.device_manufacturer)?;
        reader.read_exact(&mut self.device_model)?;
        reader.read_exact(&mut self.device_attributes)?;
        reader.read_exact(&mut self.rendering_intent)?;
        reader.read_exact(&mut self.pcs_illuminant)?;
        reader.read_exact(&mut self.profile_creator)?;
        reader.read_exact(&mut self.profile_id)?;

        // Bytes 100 to 127 are reserved and shall be zero
        reader.read_exact(&mut self.reserved)?;

        Ok(())
    }
}

use std::fmt;

// Every marker starts with this byte
pub const MARKER_IDENTIFIER: u8 = 0xff;

/// The byte following the marker identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerType(pub u8);

impl MarkerType {
    pub const START_OF_FRAME_BASELINE: MarkerType = MarkerType(0xc0); // SOF0
    pub const START_OF_FRAME_PROGRESSIVE: MarkerType = MarkerType(0xc2); // SOF2
    pub const DEFINE_HUFFMAN_TABLE: MarkerType = MarkerType(0xc4); // DHT
    pub const RESTART_0: MarkerType = MarkerType(0xd0); // RST0
    pub const RESTART_7: MarkerType = MarkerType(0xd7); // RST7
    pub const START_OF_IMAGE: MarkerType = MarkerType(0xd8); // SOI
    pub const END_OF_IMAGE: MarkerType = MarkerType(0xd9); // EOI
    pub const START_OF_SCAN: MarkerType = MarkerType(0xda); // SOS
    pub const DEFINE_QUANTISATION_TABLE: MarkerType = MarkerType(0xdb); // DQT
    pub const DEFINE_RESTART_INTERVAL: MarkerType = MarkerType(0xdd); // DRI
    pub const APP_0: MarkerType = MarkerType(0xe0); // APP0
    pub const APP_2: MarkerType = MarkerType(0xe2); // APP2
    pub const APP_15: MarkerType = MarkerType(0xef); // APP15
    pub const COMMENT: MarkerType = MarkerType(0xfe); // COM

    pub fn is_restart(self) -> bool {
        (Self::RESTART_0.0..=Self::RESTART_7.0).contains(&self.0)
    }

    pub fn is_application(self) -> bool {
        (Self::APP_0.0..=Self::APP_15.0).contains(&self.0)
    }

    pub fn is_start_of_frame(self) -> bool {
        self == Self::START_OF_FRAME_BASELINE || self == Self::START_OF_FRAME_PROGRESSIVE
    }

    /// Whether a marker of this type starts entropy-coded data.
    pub fn precedes_entropy_coded_data(self) -> bool {
        self == Self::START_OF_SCAN || self.is_restart()
    }

    /// Whether the marker is followed by a length field.
    ///
    /// `None` for marker types this reader does not know.
    pub fn has_length(self) -> Option<bool> {
        match self {
            t if t.is_restart() => Some(false),
            Self::START_OF_IMAGE | Self::END_OF_IMAGE => Some(false),
            Self::START_OF_FRAME_BASELINE
            | Self::START_OF_FRAME_PROGRESSIVE
            | Self::DEFINE_HUFFMAN_TABLE
            | Self::START_OF_SCAN
            | Self::DEFINE_QUANTISATION_TABLE
            | Self::DEFINE_RESTART_INTERVAL
            | Self::COMMENT => Some(true),
            t if t.is_application() => Some(true),
            _ => None,
        }
    }
}

impl fmt::Display for MarkerType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::START_OF_FRAME_BASELINE => write!(f, "SOF0"),
            Self::START_OF_FRAME_PROGRESSIVE => write!(f, "SOF2"),
            Self::DEFINE_HUFFMAN_TABLE => write!(f, "DHT"),
            Self::START_OF_IMAGE => write!(f, "SOI"),
            Self::END_OF_IMAGE => write!(f, "EOI"),
            Self::START_OF_SCAN => write!(f, "SOS"),
            Self::DEFINE_QUANTISATION_TABLE => write!(f, "DQT"),
            Self::DEFINE_RESTART_INTERVAL => write!(f, "DRI"),
            Self::COMMENT => write!(f, "COM"),
            t if t.is_restart() => write!(f, "RST{}", t.0 - Self::RESTART_0.0),
            t if t.is_application() => write!(f, "APP{}", t.0 - Self::APP_0.0),
            MarkerType(value) => write!(f, "0x{:02X}", value),
        }
    }
}

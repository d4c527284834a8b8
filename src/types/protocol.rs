//! Wire protocol versions

use serde::{Deserialize, Serialize};

use super::Rgb;

/// Order in which the three channels of one LED go out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

impl ChannelOrder {
    /// Write `color` into the first three bytes of `out`.
    #[inline]
    pub fn write(self, color: Rgb, out: &mut [u8]) {
        let bytes = match self {
            ChannelOrder::Rgb => [color.r, color.g, color.b],
            ChannelOrder::Bgr => [color.b, color.g, color.r],
        };
        out[..3].copy_from_slice(&bytes);
    }

    /// Read a color back from the first three bytes of `bytes`.
    #[inline]
    pub fn read(self, bytes: &[u8]) -> Rgb {
        match self {
            ChannelOrder::Rgb => Rgb::new(bytes[0], bytes[1], bytes[2]),
            ChannelOrder::Bgr => Rgb::new(bytes[2], bytes[1], bytes[0]),
        }
    }
}

/// Byte layout of one transmitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameFormat {
    pub order: ChannelOrder,
    /// Append one byte holding the sum of all channel bytes modulo 256.
    pub checksum: bool,
}

impl FrameFormat {
    /// Total frame length for a tile with `leds` LEDs.
    pub fn frame_len(&self, leds: usize) -> usize {
        leds * 3 + usize::from(self.checksum)
    }
}

/// Firmware protocol revision spoken by a tile.
///
/// The revisions disagree on channel order and on the checksum trailer, so
/// the revision is always explicit configuration:
///
/// | version | channel order | checksum byte |
/// |---------|---------------|---------------|
/// | `V1`    | B, G, R       | no            |
/// | `V2`    | R, G, B       | yes           |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    /// Single-tile firmware fed with raw BGR camera frames.
    V1,
    /// Checksummed firmware.
    #[default]
    V2,
    /// Any other combination, for firmware builds outside the two above.
    Custom { order: ChannelOrder, checksum: bool },
}

impl ProtocolVersion {
    pub fn format(self) -> FrameFormat {
        match self {
            ProtocolVersion::V1 => FrameFormat { order: ChannelOrder::Bgr, checksum: false },
            ProtocolVersion::V2 => FrameFormat { order: ChannelOrder::Rgb, checksum: true },
            ProtocolVersion::Custom { order, checksum } => FrameFormat { order, checksum },
        }
    }
}

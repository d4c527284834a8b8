//! RGB color value

use serde::{Deserialize, Serialize};

/// One LED color, 8 bits per channel.
///
/// Channels are always stored as red, green, blue. The order they go out on
/// the wire is decided by the [`ChannelOrder`](super::ChannelOrder) of the
/// tile's protocol version, never by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `factor`, truncating towards zero.
    ///
    /// `factor` is expected in `[0, 1]`; callers validate it beforehand.
    pub fn scale(self, factor: f32) -> Self {
        let apply = |channel: u8| (f32::from(channel) * factor) as u8;
        Self { r: apply(self.r), g: apply(self.g), b: apply(self.b) }
    }

    pub fn is_black(self) -> bool {
        self == Self::BLACK
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(color: Rgb) -> Self {
        [color.r, color.g, color.b]
    }
}

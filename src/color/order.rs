use super::Rgb;

/// Order in which a chipset expects the colour channels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorOrder {
    #[default]
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl ColorOrder {
    /// Wire position to RGB channel index (0 = red, 1 = green, 2 = blue).
    pub const fn permutation(self) -> [usize; 3] {
        match self {
            Self::Rgb => [0, 1, 2],
            Self::Rbg => [0, 2, 1],
            Self::Grb => [1, 0, 2],
            Self::Gbr => [1, 2, 0],
            Self::Brg => [2, 0, 1],
            Self::Bgr => [2, 1, 0],
        }
    }

    /// Reorder a colour into wire order.
    pub const fn apply(self, color: Rgb) -> [u8; 3] {
        let channels = [color.r, color.g, color.b];
        let [first, second, third] = self.permutation();
        [channels[first], channels[second], channels[third]]
    }
}

// Pixel mixing - RGB565 channel averaging
//
// Every interpolated output pixel goes through `mix`, so it has to stay
// a handful of bit operations with no branches.

/// Bits kept from each input before halving: every channel minus its lowest bit.
///
/// `1111_0111_1101_1110` - red 15..11, green 10..5, blue 4..0.
pub const CHANNEL_HIGH_MASK: u16 = 0xF7DE;

/// Lowest bit of each channel (`0000_1000_0010_0001`).
pub const CHANNEL_LOW_MASK: u16 = 0x0821;

/// Pack 8-bit RGB components into an RGB565 sample
#[inline]
pub const fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

/// Expand an RGB565 sample to RGBA8888
///
/// The low bits of each channel are filled from its high bits so that
/// full-scale channels map to 0xFF.
#[inline]
pub fn rgb565_to_rgba(pixel: u16) -> [u8; 4] {
    let r = ((pixel >> 11) & 0x1F) as u8;
    let g = ((pixel >> 5) & 0x3F) as u8;
    let b = (pixel & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2), 0xFF]
}

/// Average two RGB565 samples channel by channel
///
/// Both inputs drop the low bit of every channel before being halved, so no
/// carry can cross from one channel into the next. The low bits that both
/// inputs share are added back afterwards, which keeps `mix(a, a) == a`.
///
/// # Arguments
/// * `a` - First RGB565 sample
/// * `b` - Second RGB565 sample
///
/// # Returns
/// The per-channel average of `a` and `b`
#[inline(always)]
pub fn mix(a: u16, b: u16) -> u16 {
    ((a & CHANNEL_HIGH_MASK) >> 1) + ((b & CHANNEL_HIGH_MASK) >> 1) + (a & b & CHANNEL_LOW_MASK)
}

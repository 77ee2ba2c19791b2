//! sRGB colors as stored in the zone palettes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::from_hex(0xFFFFFF);
    pub const SKY: Rgb = Rgb::from_hex(0x87CEEB);
    pub const BARK: Rgb = Rgb::from_hex(0x8B4513);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    /// Parse `#RRGGBB` or `RRGGBB`.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_hex)
    }

    /// Components as sRGB floats in `0.0..=1.0`.
    pub fn to_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// Linear interpolation toward `other`; `t` is clamped to `0..=1`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::parse_hex("#FFD700"), Some(Rgb::new(255, 215, 0)));
        assert_eq!(Rgb::parse_hex("98fb98"), Some(Rgb::from_hex(0x98FB98)));
        assert_eq!(Rgb::parse_hex("#FFF"), None);
        assert_eq!(Rgb::parse_hex("#GGGGGG"), None);
    }

    #[test]
    fn test_display_round_trips() {
        let color = Rgb::from_hex(0x4682B4);
        assert_eq!(color.to_string(), "#4682B4");
        assert_eq!(Rgb::parse_hex(&color.to_string()), Some(color));
    }

    #[test]
    fn test_lerp_endpoints_and_clamp() {
        let a = Rgb::new(0, 0, 0);
        let b = Rgb::new(200, 100, 50);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(100, 50, 25));
        assert_eq!(a.lerp(b, 7.0), b);
    }
}

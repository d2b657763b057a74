//! # Color Parsing
//!
//! Parses the CSS-style color strings stored in `fontColor`.
//!
//! ## Accepted Forms
//!
//! | Form | Example |
//! |------|---------|
//! | Short hex | `#222`, `#f00a` |
//! | Long hex | `#1a2b3c`, `#1a2b3c80` |
//! | Functional | `rgb(10, 20, 30)`, `rgba(10, 20, 30, 0.5)` |
//! | Named | `black`, `white`, `red`, `navy`, ... |
//!
//! Render never fails on a bad color: [`Color::parse_or_default`] falls back
//! to the default text color (`#222`).

use image::Rgba;
use std::fmt;
use std::str::FromStr;

use crate::error::CertigenError;

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Default text color (`#222`).
pub const DEFAULT_TEXT_COLOR: Color = Color::rgb(0x22, 0x22, 0x22);

const NAMED_COLORS: &[(&str, Color)] = &[
    ("black", Color::rgb(0, 0, 0)),
    ("white", Color::rgb(255, 255, 255)),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("navy", Color::rgb(0, 0, 128)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("silver", Color::rgb(192, 192, 192)),
    ("maroon", Color::rgb(128, 0, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("teal", Color::rgb(0, 128, 128)),
    ("olive", Color::rgb(128, 128, 0)),
    ("orange", Color::rgb(255, 165, 0)),
    ("gold", Color::rgb(255, 215, 0)),
    ("transparent", Color { r: 0, g: 0, b: 0, a: 0 }),
];

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a color string, falling back to `#222` when it is malformed.
    pub fn parse_or_default(s: &str) -> Self {
        match s.parse() {
            Ok(color) => color,
            Err(e) => {
                tracing::warn!("{}; using default text color", e);
                DEFAULT_TEXT_COLOR
            }
        }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    fn from_hex(hex: &str) -> Option<Self> {
        if !hex.is_ascii() {
            return None;
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

        match hex.len() {
            3 => Some(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            4 => Some(Self {
                r: nibble(0)?,
                g: nibble(1)?,
                b: nibble(2)?,
                a: nibble(3)?,
            }),
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => None,
        }
    }

    fn from_functional(s: &str) -> Option<Self> {
        let (args, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest.strip_suffix(')')?, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest.strip_suffix(')')?, false)
        } else {
            return None;
        };

        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let channel = |p: &str| p.parse::<f32>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);

        match (parts.as_slice(), has_alpha) {
            ([r, g, b], false) => Some(Self::rgb(channel(r)?, channel(g)?, channel(b)?)),
            ([r, g, b, a], true) => {
                let alpha = a.parse::<f32>().ok()?.clamp(0.0, 1.0);
                Some(Self {
                    r: channel(r)?,
                    g: channel(g)?,
                    b: channel(b)?,
                    a: (alpha * 255.0).round() as u8,
                })
            }
            _ => None,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        DEFAULT_TEXT_COLOR
    }
}

impl FromStr for Color {
    type Err = CertigenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_lowercase();
        let parsed = if let Some(hex) = trimmed.strip_prefix('#') {
            Self::from_hex(hex)
        } else if trimmed.starts_with("rgb") {
            Self::from_functional(&trimmed.replace(' ', ""))
        } else {
            NAMED_COLORS
                .iter()
                .find(|(name, _)| *name == trimmed)
                .map(|(_, color)| *color)
        };

        parsed.ok_or_else(|| CertigenError::InvalidInput(format!("invalid color '{}'", s)))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hex() {
        assert_eq!("#222".parse::<Color>().unwrap(), Color::rgb(0x22, 0x22, 0x22));
        assert_eq!("#F00".parse::<Color>().unwrap(), Color::rgb(255, 0, 0));
    }

    #[test]
    fn test_long_hex_with_alpha() {
        let c: Color = "#1a2b3c80".parse().unwrap();
        assert_eq!(c, Color { r: 0x1a, g: 0x2b, b: 0x3c, a: 0x80 });
    }

    #[test]
    fn test_functional_forms() {
        assert_eq!("rgb(10, 20, 30)".parse::<Color>().unwrap(), Color::rgb(10, 20, 30));
        let c: Color = "rgba(10,20,30,0.5)".parse().unwrap();
        assert_eq!(c.a, 128);
    }

    #[test]
    fn test_named() {
        assert_eq!("Navy".parse::<Color>().unwrap(), Color::rgb(0, 0, 128));
    }

    #[test]
    fn test_invalid_falls_back() {
        assert!("#12".parse::<Color>().is_err());
        assert!("#gggggg".parse::<Color>().is_err());
        assert_eq!(Color::parse_or_default("not-a-color"), DEFAULT_TEXT_COLOR);
    }

    #[test]
    fn test_display_round_trip() {
        let c = Color::rgb(0x12, 0xab, 0xef);
        assert_eq!(c.to_string(), "#12abef");
        assert_eq!(c.to_string().parse::<Color>().unwrap(), c);
    }
}

//! Static colour catalogue for canvas backgrounds.
//!
//! Editing parameters refer to swatches by identity ([`SolidId`],
//! [`GradientId`]); the concrete colours only materialise when the background
//! layer is painted. Adding a swatch means adding an enum variant, so every
//! `match` below is checked for exhaustiveness by the compiler.
//!
//! | Kind | Ids |
//! |---|---|
//! | Solid | `white`, `black`, `graphite`, `cloud`, `sky`, `mint`, `peach`, `lavender` |
//! | Gradient | `sunset`, `ocean`, `candy`, `forest`, `midnight`, `aurora` |
//!
//! Most gradients are two-stop. A gradient may carry more stops (`aurora`
//! has a middle one); the background stage hands all of them, in order, to
//! the diagonal linear gradient.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    #[error("unknown solid colour '{0}'")]
    UnknownSolid(String),
    #[error("unknown gradient '{0}'")]
    UnknownGradient(String),
}

/// Straight-alpha RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        let [r, g, b, a] = self.0;
        tiny_skia::Color::from_rgba8(r, g, b, a)
    }

    pub fn hex(self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

/// One stop of a linear gradient; `position` runs from 0.0 (start) to 1.0 (end).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub position: f32,
    pub color: Rgba,
}

const fn stop(position: f32, r: u8, g: u8, b: u8) -> GradientStop {
    GradientStop {
        position,
        color: Rgba::new(r, g, b, 255),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolidId {
    #[default]
    White,
    Black,
    Graphite,
    Cloud,
    Sky,
    Mint,
    Peach,
    Lavender,
}

impl SolidId {
    pub const ALL: [SolidId; 8] = [
        SolidId::White,
        SolidId::Black,
        SolidId::Graphite,
        SolidId::Cloud,
        SolidId::Sky,
        SolidId::Mint,
        SolidId::Peach,
        SolidId::Lavender,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SolidId::White => "white",
            SolidId::Black => "black",
            SolidId::Graphite => "graphite",
            SolidId::Cloud => "cloud",
            SolidId::Sky => "sky",
            SolidId::Mint => "mint",
            SolidId::Peach => "peach",
            SolidId::Lavender => "lavender",
        }
    }

    pub fn color(self) -> Rgba {
        match self {
            SolidId::White => Rgba::new(255, 255, 255, 255),
            SolidId::Black => Rgba::new(0, 0, 0, 255),
            SolidId::Graphite => Rgba::new(44, 47, 54, 255),
            SolidId::Cloud => Rgba::new(236, 239, 244, 255),
            SolidId::Sky => Rgba::new(125, 185, 255, 255),
            SolidId::Mint => Rgba::new(152, 230, 196, 255),
            SolidId::Peach => Rgba::new(255, 203, 164, 255),
            SolidId::Lavender => Rgba::new(199, 180, 255, 255),
        }
    }
}

impl fmt::Display for SolidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolidId {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SolidId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PaletteError::UnknownSolid(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradientId {
    #[default]
    Sunset,
    Ocean,
    Candy,
    Forest,
    Midnight,
    Aurora,
}

const SUNSET: &[GradientStop] = &[stop(0.0, 255, 94, 98), stop(1.0, 255, 195, 113)];
const OCEAN: &[GradientStop] = &[stop(0.0, 33, 147, 176), stop(1.0, 109, 213, 237)];
const CANDY: &[GradientStop] = &[stop(0.0, 252, 92, 125), stop(1.0, 106, 130, 251)];
const FOREST: &[GradientStop] = &[stop(0.0, 19, 78, 94), stop(1.0, 113, 178, 128)];
const MIDNIGHT: &[GradientStop] = &[stop(0.0, 35, 37, 38), stop(1.0, 65, 67, 69)];
const AURORA: &[GradientStop] = &[
    stop(0.0, 0, 198, 255),
    stop(0.5, 146, 111, 255),
    stop(1.0, 255, 111, 216),
];

impl GradientId {
    pub const ALL: [GradientId; 6] = [
        GradientId::Sunset,
        GradientId::Ocean,
        GradientId::Candy,
        GradientId::Forest,
        GradientId::Midnight,
        GradientId::Aurora,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GradientId::Sunset => "sunset",
            GradientId::Ocean => "ocean",
            GradientId::Candy => "candy",
            GradientId::Forest => "forest",
            GradientId::Midnight => "midnight",
            GradientId::Aurora => "aurora",
        }
    }

    /// Ordered colour stops, always at least two and starting at 0 and
    /// ending at 1.
    pub fn stops(self) -> &'static [GradientStop] {
        match self {
            GradientId::Sunset => SUNSET,
            GradientId::Ocean => OCEAN,
            GradientId::Candy => CANDY,
            GradientId::Forest => FOREST,
            GradientId::Midnight => MIDNIGHT,
            GradientId::Aurora => AURORA,
        }
    }
}

impl fmt::Display for GradientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GradientId {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GradientId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PaletteError::UnknownGradient(s.to_string()))
    }
}

/// A palette entry as shown by `shotframe palette`.
#[derive(Debug, Clone, PartialEq)]
pub enum PaletteEntry {
    Solid(SolidId),
    Gradient(GradientId),
}

/// Every swatch, solids first, in catalogue order.
pub fn entries() -> Vec<PaletteEntry> {
    SolidId::ALL
        .into_iter()
        .map(PaletteEntry::Solid)
        .chain(GradientId::ALL.into_iter().map(PaletteEntry::Gradient))
        .collect()
}

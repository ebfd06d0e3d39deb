//! State Identity Assignment
//!
//! Deterministic visual identity for states. A scale-0 state's color is a pure
//! function of its `stateNo`; a coarse state borrows the color of one of the
//! finest-grain states it aggregates, so a logical state keeps its color when
//! the user moves between scales and when it shows up in the occupancy history.
//!
//! Copyright (c) 2025 Mohammad Atashi. All rights reserved.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::model::{Scale, State, StateNo};

/// Golden ratio conjugate, spreads successive hues evenly around the wheel
const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;

/// 24-bit RGB color, serialized as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color literal {0:?} (expected #rrggbb)")]
pub struct ColorParseError(String);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from channels in `[0, 1]`
    fn from_unit(r: f32, g: f32, b: f32) -> Self {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgb(channel(r), channel(g), channel(b))
    }

    /// HSL to RGB, all components in `[0, 1]`
    fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let x = c * (1.0 - ((hue * 6.0) % 2.0 - 1.0).abs());
        let m = lightness - c / 2.0;

        let (r, g, b) = match (hue * 6.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        Self::from_unit(r + m, g + m, b + m)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.is_ascii())
            .ok_or_else(|| ColorParseError(s.to_string()))?;
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError(s.to_string()))
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let literal = String::deserialize(deserializer)?;
        literal.parse().map_err(serde::de::Error::custom)
    }
}

/// Ten-color categorical scheme
pub const CATEGORY10: [Color; 10] = [
    Color::rgb(0x1f, 0x77, 0xb4),
    Color::rgb(0xff, 0x7f, 0x0e),
    Color::rgb(0x2c, 0xa0, 0x2c),
    Color::rgb(0xd6, 0x27, 0x28),
    Color::rgb(0x94, 0x67, 0xbd),
    Color::rgb(0x8c, 0x56, 0x4b),
    Color::rgb(0xe3, 0x77, 0xc2),
    Color::rgb(0x7f, 0x7f, 0x7f),
    Color::rgb(0xbc, 0xbd, 0x22),
    Color::rgb(0x17, 0xbe, 0xcf),
];

/// Rule mapping a derivation key to a color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Palette {
    /// Fixed list indexed by `key mod len`
    Categorical { colors: Vec<Color> },
    /// Golden-ratio hue walk, unbounded number of distinct hues
    GoldenRatio { saturation: f32, lightness: f32 },
}

impl Default for Palette {
    fn default() -> Self {
        Self::Categorical {
            colors: CATEGORY10.to_vec(),
        }
    }
}

impl Palette {
    /// Color for a derivation key
    pub fn color_for(&self, key: StateNo) -> Color {
        match self {
            Self::Categorical { colors } if !colors.is_empty() => {
                colors[key as usize % colors.len()]
            }
            Self::Categorical { .. } => golden_ratio_color(key, 0.7, 0.6),
            Self::GoldenRatio {
                saturation,
                lightness,
            } => golden_ratio_color(key, *saturation, *lightness),
        }
    }
}

fn golden_ratio_color(key: StateNo, saturation: f32, lightness: f32) -> Color {
    let hue = (key as f32 * GOLDEN_RATIO_CONJUGATE) % 1.0;
    Color::from_hsl(hue, saturation, lightness)
}

/// Key from which a state's color derives.
///
/// Scale-0 states use their own `stateNo`. Coarse states use the smallest
/// finest-grain id they aggregate, so their color is that member's color.
pub fn derivation_key(scale_index: usize, state: &State) -> StateNo {
    if scale_index == 0 {
        return state.state_no;
    }
    state
        .initial_states
        .iter()
        .copied()
        .min()
        .unwrap_or(state.state_no)
}

/// Pure color of a state under a palette
pub fn state_color(palette: &Palette, scale_index: usize, state: &State) -> Color {
    palette.color_for(derivation_key(scale_index, state))
}

/// Color already assigned to a state, or the default-palette color otherwise
pub fn resolved_color(scale_index: usize, state: &State) -> Color {
    state
        .color
        .unwrap_or_else(|| state_color(&Palette::default(), scale_index, state))
}

/// Write a color on every state of every scale
pub fn assign_colors(scales: &mut [Scale], palette: &Palette) {
    for (scale_index, scale) in scales.iter_mut().enumerate() {
        for state in &mut scale.states {
            if scale_index > 0 && state.initial_states.is_empty() {
                log::warn!(
                    "State {} at scale {} aggregates nothing; coloring by its own number",
                    state.state_no,
                    scale_index
                );
            }
            state.color = Some(state_color(palette, scale_index, state));
        }
    }
}

/// Coarse states whose color matches none of their aggregated finest states
pub fn verify_color_consistency(scales: &[Scale]) -> Vec<(usize, StateNo)> {
    let Some(finest) = scales.first() else {
        return Vec::new();
    };
    let finest_colors: HashMap<StateNo, Option<Color>> = finest
        .states
        .iter()
        .map(|state| (state.state_no, state.color))
        .collect();

    let mut inconsistent = Vec::new();
    for (scale_index, scale) in scales.iter().enumerate().skip(1) {
        for state in &scale.states {
            if state.initial_states.is_empty() {
                continue;
            }
            let matches_member = state
                .initial_states
                .iter()
                .any(|member| finest_colors.get(member).copied().flatten() == state.color);
            if !matches_member {
                inconsistent.push((scale_index, state.state_no));
            }
        }
    }
    inconsistent
}

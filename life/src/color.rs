//! HSL colors and the blending math used by the color strategies.
//!
//! Hue is in degrees `[0, 360)`, saturation and lightness in percent `[0, 100]`.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A color in cylindrical HSL coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const WHITE: Self = Self::new(0.0, 0.0, 100.0);
    pub const BLACK: Self = Self::new(0.0, 100.0, 0.0);

    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    /// Fully saturated, mid-lightness color at `hue` degrees (wrapped).
    pub fn vivid(hue: f32) -> Self {
        Self::new(hue.rem_euclid(360.0), 100.0, 50.0)
    }

    /// Converts to 8-bit sRGB channels.
    pub fn to_rgb8(self) -> [u8; 3] {
        let h = self.h.rem_euclid(360.0) / 360.0;
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);

        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return [v, v, v];
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |t: f32| {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        };

        [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.h, self.s, self.l)
    }
}

/// Error returned when a string is not of the form `hsl(h, s%, l%)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected hsl(h, s%, l%), got {0:?}")]
pub struct ParseHslError(String);

impl FromStr for Hsl {
    type Err = ParseHslError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let err = || ParseHslError(text.to_string());
        let inner = text
            .trim()
            .strip_prefix("hsl(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(err)?;

        let mut parts = inner.split(',').map(str::trim);
        let mut next = |percent: bool| -> Result<f32, ParseHslError> {
            let part = parts.next().ok_or_else(err)?;
            let part = if percent {
                part.strip_suffix('%').ok_or_else(err)?
            } else {
                part
            };
            part.parse::<f32>().map_err(|_| err())
        };

        let color = Hsl::new(next(false)?, next(true)?, next(true)?);
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(color)
    }
}

/// Average of `colors` treating hue as an angle on the color wheel.
///
/// Saturation is the plain mean of the inputs rather than the length of the
/// averaged vector, so opposing hues do not wash out to grey. Returns `None`
/// for an empty slice.
pub fn average(colors: &[Hsl]) -> Option<Hsl> {
    match colors {
        [] => return None,
        [single] => return Some(*single),
        _ => {}
    }

    let n = colors.len() as f64;
    let (mut x, mut y, mut s, mut l) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
    for color in colors {
        let angle = f64::from(color.h) / 360.0 * TAU;
        let radius = f64::from(color.s) / 100.0;
        x += radius * angle.cos() / n;
        y += radius * angle.sin() / n;
        s += f64::from(color.s) / n;
        l += f64::from(color.l) / n;
    }

    let turns = (y.atan2(x) / TAU + 1.0) % 1.0;
    let mut hue = (turns * 360.0) as f32;
    if hue >= 360.0 {
        hue = 0.0;
    }
    Some(Hsl::new(hue, s as f32, l as f32))
}

/// Weighted per-channel arithmetic mean.
///
/// Hue is averaged as a plain number, so hues on either side of 0/360 blend
/// towards cyan instead of red. Returns `None` when the weights sum to zero.
pub fn linear_average(colors: &[Hsl], weights: &[f32]) -> Option<Hsl> {
    let total: f64 = weights.iter().map(|w| f64::from(*w)).sum();
    if total <= 0.0 {
        return None;
    }

    let (mut h, mut s, mut l) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (color, weight) in colors.iter().zip(weights) {
        let weight = f64::from(*weight);
        h += f64::from(color.h) * weight;
        s += f64::from(color.s) * weight;
        l += f64::from(color.l) * weight;
    }
    Some(Hsl::new((h / total) as f32, (s / total) as f32, (l / total) as f32))
}

/// A random, bright color in whole-number coordinates.
pub fn random_bright<R: Rng + ?Sized>(rng: &mut R) -> Hsl {
    Hsl::new(
        rng.random_range(0..360) as f32,
        rng.random_range(55..=100) as f32,
        rng.random_range(40..=60) as f32,
    )
}

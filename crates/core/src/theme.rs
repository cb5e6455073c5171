//! Organization theme palette.
//!
//! [`ThemePalette::from_theme`] turns the two stored hex colours into the
//! display tokens a front-end applies as CSS custom properties. It is a pure
//! function of the stored [`Theme`](crate::settings::Theme); nothing here
//! mutates shared state.

use serde::Serialize;
use thiserror::Error;

use crate::settings::Theme;

/// Relative luminance above which dark text is used on top of a colour.
const CONTRAST_LUMINANCE_THRESHOLD: f64 = 0.179;
/// How much darker the hover shade is.
const HOVER_DARKEN: f64 = 0.10;
/// How far the light tint moves toward white.
const LIGHT_MIX: f64 = 0.85;

/// Errors parsing a hex colour.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ThemeError {
    /// The value does not start with `#`.
    #[error("colour '{0}' must start with #")]
    MissingHash(String),
    /// The value is not 3 or 6 hex digits.
    #[error("colour '{0}' must be #RGB or #RRGGBB")]
    InvalidHex(String),
}

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// `#RRGGBB`, uppercase.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// WCAG relative luminance in `0.0..=1.0`.
    #[must_use]
    pub fn relative_luminance(self) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = f64::from(c) / 255.0;
            if c <= 0.039_28 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.0722_f64.mul_add(
            channel(self.b),
            0.2126_f64.mul_add(channel(self.r), 0.7152 * channel(self.g)),
        )
    }

    fn scale(self, factor: f64) -> Self {
        let scale = |c: u8| to_channel(f64::from(c) * factor);
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
        }
    }

    fn mix_white(self, amount: f64) -> Self {
        let mix = |c: u8| to_channel((255.0 - f64::from(c)).mul_add(amount, f64::from(c)));
        Self {
            r: mix(self.r),
            g: mix(self.g),
            b: mix(self.b),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=255 first
fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Parse `#RGB` or `#RRGGBB` (case-insensitive).
///
/// # Errors
///
/// Returns [`ThemeError`] if the value is not a hex colour.
pub fn parse_hex(value: &str) -> Result<Rgb, ThemeError> {
    let value = value.trim();
    let digits = value
        .strip_prefix('#')
        .ok_or_else(|| ThemeError::MissingHash(value.to_owned()))?;
    let invalid = || ThemeError::InvalidHex(value.to_owned());

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_owned(),
        _ => return Err(invalid()),
    };

    let channel = |range: std::ops::Range<usize>| {
        expanded
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .ok_or_else(invalid)
    };

    Ok(Rgb {
        r: channel(0..2)?,
        g: channel(2..4)?,
        b: channel(4..6)?,
    })
}

/// Display tokens derived from one theme colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorTokens {
    /// Normalized `#RRGGBB`.
    pub base: String,
    /// Space-separated channels, e.g. `30 64 175`.
    pub rgb: String,
    /// Slightly darker shade for hover states.
    pub hover: String,
    /// Pale tint for backgrounds.
    pub light: String,
    /// `#FFFFFF` or `#000000`, whichever reads better on `base`.
    pub contrast: String,
}

impl ColorTokens {
    fn from_rgb(color: Rgb) -> Self {
        let contrast = if color.relative_luminance() > CONTRAST_LUMINANCE_THRESHOLD {
            "#000000"
        } else {
            "#FFFFFF"
        };
        Self {
            base: color.to_hex(),
            rgb: format!("{} {} {}", color.r, color.g, color.b),
            hover: color.scale(1.0 - HOVER_DARKEN).to_hex(),
            light: color.mix_white(LIGHT_MIX).to_hex(),
            contrast: contrast.to_owned(),
        }
    }
}

/// The palette for both theme colours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemePalette {
    pub primary: ColorTokens,
    pub secondary: ColorTokens,
}

impl ThemePalette {
    /// Derive the palette from the stored theme.
    ///
    /// # Errors
    ///
    /// Returns [`ThemeError`] if either colour is not a hex colour.
    pub fn from_theme(theme: &Theme) -> Result<Self, ThemeError> {
        Ok(Self {
            primary: ColorTokens::from_rgb(parse_hex(&theme.primary)?),
            secondary: ColorTokens::from_rgb(parse_hex(&theme.secondary)?),
        })
    }

    /// CSS custom properties as `(name, value)` pairs.
    #[must_use]
    pub fn css_variables(&self) -> Vec<(String, String)> {
        [("primary", &self.primary), ("secondary", &self.secondary)]
            .into_iter()
            .flat_map(|(name, tokens)| {
                [
                    (format!("--color-{name}"), tokens.base.clone()),
                    (format!("--color-{name}-rgb"), tokens.rgb.clone()),
                    (format!("--color-{name}-hover"), tokens.hover.clone()),
                    (format!("--color-{name}-light"), tokens.light.clone()),
                    (format!("--color-{name}-contrast"), tokens.contrast.clone()),
                ]
            })
            .collect()
    }

    /// Render a `:root` block declaring every custom property.
    #[must_use]
    pub fn to_css(&self) -> String {
        let body: String = self
            .css_variables()
            .into_iter()
            .map(|(name, value)| format!("  {name}: {value};\n"))
            .collect();
        format!(":root {{\n{body}}}\n")
    }
}

//! Colors, paints, strokes, and layer effects.

use serde::{Deserialize, Serialize};

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color: 8-bit channels plus a [0.0, 1.0] alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let short = |i: usize| hex_val(bytes[i]).map(|v| v * 17);
        let long = |i: usize| Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?);

        match bytes.len() {
            3 => Some(Self::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Some(Self::rgba(
                short(0)?,
                short(1)?,
                short(2)?,
                f64::from(short(3)?) / 255.0,
            )),
            6 => Some(Self::rgb(long(0)?, long(2)?, long(4)?)),
            8 => Some(Self::rgba(
                long(0)?,
                long(2)?,
                long(4)?,
                f64::from(long(6)?) / 255.0,
            )),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        if a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, a)
        }
    }

    /// Shift each RGB channel by a signed amount, saturating at [0, 255].
    pub fn shifted(&self, dr: i32, dg: i32, db: i32) -> Rgba {
        let shift = |c: u8, d: i32| (i32::from(c) + d).clamp(0, 255) as u8;
        Rgba::rgba(
            shift(self.r, dr),
            shift(self.g, dg),
            shift(self.b, db),
            self.a,
        )
    }
}

// ─── Paint ───────────────────────────────────────────────────────────────

/// A gradient stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f64, // 0.0 .. 1.0
    pub color: Rgba,
}

/// How an image fills its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFit {
    #[default]
    Cover,
    Contain,
    Fill,
    Tile,
}

/// Fill or stroke paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Paint {
    Solid {
        color: Rgba,
    },
    Gradient {
        stops: Vec<GradientStop>,
        #[serde(default)]
        angle: f64, // degrees
    },
    Image {
        #[serde(rename = "ref")]
        image_ref: String,
        #[serde(default)]
        fit: ImageFit,
    },
    Pattern {
        #[serde(rename = "ref")]
        pattern_ref: String,
        #[serde(default = "unit_scale")]
        scale: f64,
        #[serde(default)]
        rotation: f64,
    },
}

fn unit_scale() -> f64 {
    1.0
}

impl Paint {
    pub fn solid(color: Rgba) -> Self {
        Paint::Solid { color }
    }

    /// The color that best represents this paint for contrast purposes:
    /// the solid color, or the first gradient stop.
    pub fn representative_color(&self) -> Option<Rgba> {
        match self {
            Paint::Solid { color } => Some(*color),
            Paint::Gradient { stops, .. } => stops.first().map(|s| s.color),
            Paint::Image { .. } | Paint::Pattern { .. } => None,
        }
    }
}

// ─── Stroke ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub paint: Paint,
    pub width: f64,
    #[serde(default)]
    pub dash: Vec<f64>,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            paint: Paint::solid(Rgba::BLACK),
            width: 1.0,
            dash: Vec::new(),
        }
    }
}

// ─── Effects ─────────────────────────────────────────────────────────────

/// Post-processing effect attached to a layer. Order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Effect {
    #[serde(rename_all = "camelCase")]
    DropShadow {
        enabled: bool,
        offset_x: f64,
        offset_y: f64,
        blur: f64,
        #[serde(default)]
        spread: f64,
        color: Rgba,
    },
    #[serde(rename_all = "camelCase")]
    InnerShadow {
        enabled: bool,
        offset_x: f64,
        offset_y: f64,
        blur: f64,
        color: Rgba,
    },
    Blur {
        enabled: bool,
        radius: f64,
    },
    Glow {
        enabled: bool,
        radius: f64,
        color: Rgba,
    },
    Outline {
        enabled: bool,
        width: f64,
        color: Rgba,
    },
    ColorAdjust {
        enabled: bool,
        #[serde(default)]
        brightness: f64,
        #[serde(default)]
        contrast: f64,
        #[serde(default)]
        saturation: f64,
        #[serde(default)]
        hue: f64,
    },
    Noise {
        enabled: bool,
        amount: f64,
    },
}

impl Effect {
    /// The stock drop shadow used by "add shadow" edits.
    pub fn soft_shadow() -> Self {
        Effect::DropShadow {
            enabled: true,
            offset_x: 0.0,
            offset_y: 4.0,
            blur: 12.0,
            spread: 0.0,
            color: Rgba::rgba(0, 0, 0, 0.25),
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            Effect::DropShadow { enabled, .. }
            | Effect::InnerShadow { enabled, .. }
            | Effect::Blur { enabled, .. }
            | Effect::Glow { enabled, .. }
            | Effect::Outline { enabled, .. }
            | Effect::ColorAdjust { enabled, .. }
            | Effect::Noise { enabled, .. } => *enabled,
        }
    }

    pub fn is_shadow(&self) -> bool {
        matches!(self, Effect::DropShadow { .. } | Effect::InnerShadow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_roundtrip() {
        let c = Rgba::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");

        let c2 = Rgba::from_hex("#FF000080").unwrap();
        assert!((c2.a - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(c2.to_hex().len(), 9);

        assert_eq!(Rgba::from_hex("fff"), Some(Rgba::WHITE));
        assert_eq!(Rgba::from_hex("#12345"), None);
    }

    #[test]
    fn shifted_saturates() {
        let c = Rgba::rgb(250, 10, 128).shifted(20, -20, 0);
        assert_eq!(c, Rgba::rgb(255, 0, 128));
    }

    #[test]
    fn paint_tagged_json() {
        let p: Paint = serde_json::from_str(r#"{"type":"solid","color":{"r":1,"g":2,"b":3}}"#)
            .unwrap();
        assert_eq!(p, Paint::solid(Rgba::rgb(1, 2, 3)));
    }
}

//! Color science: HSL conversion, WCAG luminance and contrast, harmonies.

use crate::paint::Rgba;

/// Near-black used for readable text on light backgrounds.
pub const NEAR_BLACK: Rgba = Rgba::rgb(0x1A, 0x1A, 0x1A);

/// Luminance above which dark text reads better than white.
pub const READABLE_LUMINANCE_THRESHOLD: f64 = 0.179;

pub const WCAG_AA: f64 = 4.5;
pub const WCAG_AA_LARGE: f64 = 3.0;
pub const WCAG_AAA: f64 = 7.0;

/// Hue in degrees [0, 360), saturation and lightness in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

pub fn rgba_to_hsl(c: Rgba) -> Hsl {
    let r = f64::from(c.r) / 255.0;
    let g = f64::from(c.g) / 255.0;
    let b = f64::from(c.b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let d = max - min;
    if d == 0.0 {
        return Hsl { h: 0.0, s: 0.0, l };
    }
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        ((g - b) / d).rem_euclid(6.0)
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    Hsl { h: h * 60.0, s, l }
}

pub fn hsl_to_rgba(hsl: Hsl, alpha: f64) -> Rgba {
    let h = hsl.h.rem_euclid(360.0) / 360.0;
    let s = hsl.s.clamp(0.0, 1.0);
    let l = hsl.l.clamp(0.0, 1.0);
    let to_byte = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    if s == 0.0 {
        let v = to_byte(l);
        return Rgba::rgba(v, v, v, alpha);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let hue = |mut t: f64| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    Rgba::rgba(
        to_byte(hue(h + 1.0 / 3.0)),
        to_byte(hue(h)),
        to_byte(hue(h - 1.0 / 3.0)),
        alpha,
    )
}

/// WCAG 2.x relative luminance.
pub fn relative_luminance(c: Rgba) -> f64 {
    let channel = |v: u8| {
        let s = f64::from(v) / 255.0;
        if s <= 0.03928 {
            s / 12.92
        } else {
            ((s + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * channel(c.r) + 0.7152 * channel(c.g) + 0.0722 * channel(c.b)
}

/// Contrast ratio in [1, 21], order-independent.
pub fn contrast_ratio(a: Rgba, b: Rgba) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (hi, lo) = if la > lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

pub fn is_wcag_aa(fg: Rgba, bg: Rgba) -> bool {
    contrast_ratio(fg, bg) >= WCAG_AA
}

pub fn is_wcag_aa_large(fg: Rgba, bg: Rgba) -> bool {
    contrast_ratio(fg, bg) >= WCAG_AA_LARGE
}

pub fn is_wcag_aaa(fg: Rgba, bg: Rgba) -> bool {
    contrast_ratio(fg, bg) >= WCAG_AAA
}

/// Near-black on light backgrounds, white on dark ones.
pub fn readable_color(bg: Rgba) -> Rgba {
    if relative_luminance(bg) > READABLE_LUMINANCE_THRESHOLD {
        NEAR_BLACK
    } else {
        Rgba::WHITE
    }
}

// ─── Harmonies ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Harmony {
    Complementary,
    Analogous,
    Triadic,
    SplitComplementary,
    Tetradic,
    Monochromatic,
}

/// Palette derived from `base` by hue rotation in HSL space. The base
/// color is always the first entry.
pub fn generate_harmony(base: Rgba, harmony: Harmony) -> Vec<Rgba> {
    let hsl = rgba_to_hsl(base);
    let rotate = |deg: f64| hsl_to_rgba(Hsl { h: hsl.h + deg, ..hsl }, base.a);
    let offsets: &[f64] = match harmony {
        Harmony::Complementary => &[180.0],
        Harmony::Analogous => &[-30.0, 30.0],
        Harmony::Triadic => &[120.0, 240.0],
        Harmony::SplitComplementary => &[150.0, 210.0],
        Harmony::Tetradic => &[90.0, 180.0, 270.0],
        Harmony::Monochromatic => {
            let mut palette = vec![base];
            for dl in [-0.3, -0.15, 0.15, 0.3] {
                palette.push(hsl_to_rgba(
                    Hsl {
                        l: (hsl.l + dl).clamp(0.0, 1.0),
                        ..hsl
                    },
                    base.a,
                ));
            }
            return palette;
        }
    };
    std::iter::once(base)
        .chain(offsets.iter().map(|&d| rotate(d)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_white_contrast_is_21() {
        let ratio = contrast_ratio(Rgba::BLACK, Rgba::WHITE);
        assert!((ratio - 21.0).abs() < 1e-9);
        assert!(is_wcag_aaa(Rgba::BLACK, Rgba::WHITE));
    }

    #[test]
    fn grey_on_white_fails_aa() {
        let grey = Rgba::rgb(0xAA, 0xAA, 0xAA);
        assert!(!is_wcag_aa(grey, Rgba::WHITE));
        assert!(!is_wcag_aa_large(grey, Rgba::WHITE));
    }

    #[test]
    fn readable_color_picks_by_luminance() {
        assert_eq!(readable_color(Rgba::WHITE), NEAR_BLACK);
        assert_eq!(readable_color(Rgba::rgb(0x20, 0x20, 0x60)), Rgba::WHITE);
    }

    #[test]
    fn hsl_roundtrip() {
        for c in [
            Rgba::rgb(255, 0, 0),
            Rgba::rgb(18, 52, 86),
            Rgba::rgb(200, 200, 200),
            Rgba::rgb(108, 92, 231),
        ] {
            assert_eq!(hsl_to_rgba(rgba_to_hsl(c), 1.0), c);
        }
    }

    #[test]
    fn complementary_of_red_is_cyan() {
        let palette = generate_harmony(Rgba::rgb(255, 0, 0), Harmony::Complementary);
        assert_eq!(palette, vec![Rgba::rgb(255, 0, 0), Rgba::rgb(0, 255, 255)]);
        assert_eq!(
            generate_harmony(Rgba::rgb(255, 0, 0), Harmony::Tetradic).len(),
            4
        );
        assert_eq!(
            generate_harmony(Rgba::rgb(255, 0, 0), Harmony::Monochromatic).len(),
            5
        );
    }
}

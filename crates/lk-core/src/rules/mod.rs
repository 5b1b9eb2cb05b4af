//! Design rules engine: color science, numeric ranges, typography and
//! spacing scales, and whole-document validation.
//!
//! Everything here is advisory. Findings never block a mutation.

pub mod color;
pub mod ranges;
pub mod validate;

// ─── Typography & spacing ────────────────────────────────────────────────

/// Modular type scale (px), smallest caption to display.
pub const TYPE_SCALE: [f64; 10] = [10.0, 12.0, 14.0, 16.0, 20.0, 24.0, 32.0, 40.0, 48.0, 64.0];

/// Spacing scale on a 4-unit baseline.
pub const SPACING_SCALE: [f64; 8] = [4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0, 64.0];

/// Minimum readable font size on screen (px).
pub const MIN_SCREEN_FONT_SIZE: f64 = 12.0;

/// Minimum readable font size in print (pt).
pub const MIN_PRINT_FONT_SIZE_PT: f64 = 6.0;

/// DPI at or above which a document is treated as print.
pub const PRINT_DPI: f64 = 300.0;

/// Font weight at which text counts as bold.
pub const BOLD_WEIGHT: u16 = 600;

/// Snap a spacing value to the closest entry of [`SPACING_SCALE`].
/// Ties resolve to the smaller step.
pub fn nearest_spacing(value: f64) -> f64 {
    nearest_in(&SPACING_SCALE, value)
}

/// Snap a font size to the closest entry of [`TYPE_SCALE`].
pub fn nearest_type_size(value: f64) -> f64 {
    nearest_in(&TYPE_SCALE, value)
}

fn nearest_in(scale: &[f64], value: f64) -> f64 {
    let mut best = scale[0];
    for &step in scale {
        if (step - value).abs() < (best - value).abs() {
            best = step;
        }
    }
    best
}

/// Convert points to device pixels at `dpi`.
pub fn pt_to_px(pt: f64, dpi: f64) -> f64 {
    pt * dpi / 72.0
}

/// Convert millimetres to device pixels at `dpi`.
pub fn mm_to_px(mm: f64, dpi: f64) -> f64 {
    mm / 25.4 * dpi
}

//! Text measurement boundary.
//!
//! The core never shapes text itself. Callers that wrap or auto-size text
//! layers plug in the rasterizer's measurer through [`TextMeasurer`];
//! [`ApproximateMeasurer`] stands in for headless use and tests.

use crate::geometry::{Transform, Vec2};
use crate::model::{Layer, TextStyle};
use crate::patch::LayerPatch;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    /// Measure `text` laid out with `style`, wrapping at `max_width` when
    /// given.
    fn measure(&self, text: &str, style: &TextStyle, max_width: Option<f64>) -> TextMetrics;
}

/// Fixed-advance estimate: every glyph is `advance × font_size` wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateMeasurer {
    pub advance: f64,
}

impl Default for ApproximateMeasurer {
    fn default() -> Self {
        Self { advance: 0.55 }
    }
}

impl ApproximateMeasurer {
    fn glyph_width(&self, style: &TextStyle) -> f64 {
        let caps = if style.uppercase { 1.15 } else { 1.0 };
        (style.font_size * self.advance * caps + style.letter_spacing).max(0.0)
    }
}

impl TextMeasurer for ApproximateMeasurer {
    fn measure(&self, text: &str, style: &TextStyle, max_width: Option<f64>) -> TextMetrics {
        let glyph = self.glyph_width(style);
        let line_height = style.font_size * style.line_height;
        let mut widest: f64 = 0.0;
        let mut lines = 0;

        for paragraph in text.split('\n') {
            let mut current = 0.0;
            lines += 1;
            for (i, word) in paragraph.split(' ').enumerate() {
                let word_width = word.chars().count() as f64 * glyph;
                let space = if i == 0 { 0.0 } else { glyph };
                if let Some(max) = max_width
                    && current > 0.0
                    && current + space + word_width > max
                {
                    widest = widest.max(current);
                    lines += 1;
                    current = word_width;
                } else {
                    current += space + word_width;
                }
            }
            widest = widest.max(current);
        }

        TextMetrics {
            width: widest,
            height: lines as f64 * line_height,
            line_count: lines,
        }
    }
}

/// Patch that grows or shrinks a text layer's height to fit its content at
/// the current width. `None` for non-text layers or when already fitted.
pub fn fit_text_height(layer: &Layer, measurer: &dyn TextMeasurer) -> Option<LayerPatch> {
    let style = layer.text_style()?;
    let text = layer.text_content()?;
    let metrics = measurer.measure(text, style, Some(layer.transform.size.x));
    let height = metrics.height.max(1.0);
    if (height - layer.transform.size.y).abs() < f64::EPSILON {
        return None;
    }
    Some(LayerPatch::transform(Transform {
        size: Vec2::new(layer.transform.size.x, height),
        ..layer.transform
    }))
}

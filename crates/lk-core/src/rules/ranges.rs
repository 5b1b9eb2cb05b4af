//! Numeric range table for editable properties.

/// Inclusive bounds for one numeric property, optionally quantized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyRange {
    pub min: f64,
    pub max: f64,
    pub step: Option<f64>,
}

/// Properties with a declared range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Opacity,
    FontSize,
    FontWeight,
    LetterSpacing,
    LineHeight,
    Rotation,
    CornerRadius,
    StrokeWidth,
    BlurRadius,
    ColorChannel,
    Position,
    Size,
}

const fn range(min: f64, max: f64) -> PropertyRange {
    PropertyRange {
        min,
        max,
        step: None,
    }
}

/// The range table, indexed by [`Property`].
pub const PROPERTY_RANGES: [(Property, PropertyRange); 12] = [
    (Property::Opacity, range(0.0, 1.0)),
    (Property::FontSize, range(4.0, 800.0)),
    (
        Property::FontWeight,
        PropertyRange {
            min: 100.0,
            max: 900.0,
            step: Some(100.0),
        },
    ),
    (Property::LetterSpacing, range(-5.0, 20.0)),
    (Property::LineHeight, range(0.8, 3.0)),
    (Property::Rotation, range(-360.0, 360.0)),
    (Property::CornerRadius, range(0.0, 500.0)),
    (Property::StrokeWidth, range(0.0, 50.0)),
    (Property::BlurRadius, range(0.0, 100.0)),
    (Property::ColorChannel, range(0.0, 255.0)),
    (Property::Position, range(-10000.0, 10000.0)),
    (Property::Size, range(1.0, 10000.0)),
];

impl Property {
    pub fn range(self) -> PropertyRange {
        PROPERTY_RANGES
            .iter()
            .find(|(p, _)| *p == self)
            .map(|(_, r)| *r)
            .unwrap_or(range(f64::MIN, f64::MAX))
    }

    /// Map a document path (e.g. `/defaultStyle/fontSize`) to its property
    /// by the trailing segment, using the parent segment where the leaf
    /// alone is ambiguous (`/transform/size/x`, `/strokes/0/width`).
    pub fn for_path(path: &str) -> Option<Property> {
        let mut segments = path.rsplit('/').filter(|s| !s.is_empty());
        let leaf = segments.next()?;
        let parent = segments.next().unwrap_or("");
        let grandparent = segments.next().unwrap_or("");
        match leaf {
            "opacity" => Some(Property::Opacity),
            "fontSize" => Some(Property::FontSize),
            "fontWeight" => Some(Property::FontWeight),
            "letterSpacing" => Some(Property::LetterSpacing),
            "lineHeight" => Some(Property::LineHeight),
            "rotation" => Some(Property::Rotation),
            "cornerRadius" => Some(Property::CornerRadius),
            "radius" | "blur" => Some(Property::BlurRadius),
            "r" | "g" | "b" => Some(Property::ColorChannel),
            "width" if grandparent == "strokes" => Some(Property::StrokeWidth),
            "x" | "y" if parent == "position" => Some(Property::Position),
            "x" | "y" if parent == "size" => Some(Property::Size),
            _ => None,
        }
    }
}

/// Clamp `value` into the property's range, rounding to the step if the
/// property is quantized. Idempotent.
pub fn clamp_to_range(value: f64, property: Property) -> f64 {
    let r = property.range();
    if value.is_nan() {
        return r.min;
    }
    let clamped = value.clamp(r.min, r.max);
    match r.step {
        Some(step) => {
            let stepped = (clamped / step).round() * step;
            stepped.clamp(r.min, r.max)
        }
        None => clamped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Property; 12] = [
        Property::Opacity,
        Property::FontSize,
        Property::FontWeight,
        Property::LetterSpacing,
        Property::LineHeight,
        Property::Rotation,
        Property::CornerRadius,
        Property::StrokeWidth,
        Property::BlurRadius,
        Property::ColorChannel,
        Property::Position,
        Property::Size,
    ];

    #[test]
    fn clamps_and_steps() {
        assert_eq!(clamp_to_range(1.7, Property::Opacity), 1.0);
        assert_eq!(clamp_to_range(-3.0, Property::Opacity), 0.0);
        assert_eq!(clamp_to_range(2.0, Property::FontSize), 4.0);
        assert_eq!(clamp_to_range(449.0, Property::FontWeight), 400.0);
        assert_eq!(clamp_to_range(1200.0, Property::FontWeight), 900.0);
        assert_eq!(clamp_to_range(0.0, Property::Size), 1.0);
    }

    #[test]
    fn clamp_is_idempotent() {
        let samples = [
            f64::NEG_INFINITY,
            -20000.0,
            -361.0,
            -5.5,
            -0.3,
            0.0,
            0.45,
            0.79,
            1.0,
            3.2,
            149.9,
            150.0,
            550.0,
            850.0,
            4096.0,
            f64::INFINITY,
            f64::NAN,
        ];
        for prop in ALL {
            for v in samples {
                let once = clamp_to_range(v, prop);
                let twice = clamp_to_range(once, prop);
                assert_eq!(once, twice, "{prop:?} not idempotent for {v}");
            }
        }
    }

    #[test]
    fn path_mapping_uses_trailing_segment() {
        assert_eq!(Property::for_path("/opacity"), Some(Property::Opacity));
        assert_eq!(
            Property::for_path("/defaultStyle/fontSize"),
            Some(Property::FontSize)
        );
        assert_eq!(Property::for_path("/icon/fontSizeRelated"), None);
        assert_eq!(
            Property::for_path("/transform/size/x"),
            Some(Property::Size)
        );
        assert_eq!(
            Property::for_path("/strokes/0/width"),
            Some(Property::StrokeWidth)
        );
        assert_eq!(Property::for_path("/fills/0/color/g"), Some(Property::ColorChannel));
        assert_eq!(Property::for_path("/text"), None);
    }
}

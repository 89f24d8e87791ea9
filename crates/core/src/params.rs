//! Conversion parameters forwarded to the server.
//!
//! These are configuration, not core logic: the client passes them
//! through unvalidated (only the upload size bound is checked locally).
//! Defaults match the converter's reset values.

use serde::{Deserialize, Serialize};

/// Default block reduction factor.
pub const DEFAULT_IMAGE_REDUCTION: u32 = 10;
/// Default glyph font size.
pub const DEFAULT_FONT_SIZE: u32 = 10;
/// Default line spacing multiplier.
pub const DEFAULT_SPACING: f64 = 1.1;
/// Default character ramp, darkest to brightest.
pub const DEFAULT_CHARACTERS: &str = " .*:+%S0#@";
/// Default frame sampling frequency for video input.
pub const DEFAULT_FRAME_FREQUENCY: u32 = 24;

/// Parameters for a single conversion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionParams {
    /// Pixel-block reduction factor.
    pub image_reduction: u32,
    /// Optional output width bound; unlimited when `None`.
    pub max_width: Option<u32>,
    /// Optional output height bound; unlimited when `None`.
    pub max_height: Option<u32>,
    /// Glyph font size in points.
    pub font_size: u32,
    /// Line spacing multiplier.
    pub spacing: f64,
    /// Character ramp used to map brightness to glyphs.
    pub characters: String,
    /// Every n-th frame is sampled for video input.
    pub frame_frequency: u32,
}

impl Default for ConversionParams {
    fn default() -> Self {
        Self {
            image_reduction: DEFAULT_IMAGE_REDUCTION,
            max_width: None,
            max_height: None,
            font_size: DEFAULT_FONT_SIZE,
            spacing: DEFAULT_SPACING,
            characters: DEFAULT_CHARACTERS.to_string(),
            frame_frequency: DEFAULT_FRAME_FREQUENCY,
        }
    }
}

impl ConversionParams {
    /// Wire-format form fields for the submit request.
    ///
    /// Field names match the server's multipart contract. Unset
    /// dimension bounds are sent as empty strings; the server treats
    /// an empty value as "no bound".
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let dim = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
        vec![
            ("imageReduction", self.image_reduction.to_string()),
            ("maxWidth", dim(self.max_width)),
            ("maxHeight", dim(self.max_height)),
            ("fontSize", self.font_size.to_string()),
            ("spacing", self.spacing.to_string()),
            ("characters", self.characters.clone()),
            ("frameFrequency", self.frame_frequency.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reset_values() {
        let params = ConversionParams::default();
        assert_eq!(params.image_reduction, 10);
        assert_eq!(params.max_width, None);
        assert_eq!(params.max_height, None);
        assert_eq!(params.font_size, 10);
        assert!((params.spacing - 1.1).abs() < f64::EPSILON);
        assert_eq!(params.characters, " .*:+%S0#@");
        assert_eq!(params.frame_frequency, 24);
    }

    #[test]
    fn form_fields_use_wire_names() {
        let fields = ConversionParams::default().form_fields();
        let names: Vec<&str> = fields.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "imageReduction",
                "maxWidth",
                "maxHeight",
                "fontSize",
                "spacing",
                "characters",
                "frameFrequency",
            ]
        );
    }

    #[test]
    fn unset_dimensions_serialize_as_empty_strings() {
        let fields = ConversionParams::default().form_fields();
        let value = |name: &str| {
            fields
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(value("maxWidth"), "");
        assert_eq!(value("maxHeight"), "");
    }

    #[test]
    fn set_dimensions_serialize_as_numbers() {
        let params = ConversionParams {
            max_width: Some(640),
            max_height: Some(480),
            ..Default::default()
        };
        let fields = params.form_fields();
        assert!(fields.contains(&("maxWidth", "640".to_string())));
        assert!(fields.contains(&("maxHeight", "480".to_string())));
    }
}

use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use nirscan::HeaderValue;

/// `n` distinct colours with evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hsl = Hsl::new(360.0 * i as f32 / n as f32, 0.7, 0.5);
            let rgb: Srgb = hsl.into_color();
            let [r, g, b] = [rgb.red, rgb.green, rgb.blue].map(|c| (c * 255.0).round() as u8);
            Color32::from_rgb(r, g, b)
        })
        .collect()
}

/// Colour per value of one header key, used by both plots and the legend.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<HeaderValue, Color32>,
}

impl ColorMap {
    pub fn new(column: &str, values: &BTreeSet<HeaderValue>) -> Self {
        let mapping = values
            .iter()
            .cloned()
            .zip(generate_palette(values.len()))
            .collect();
        ColorMap {
            column: column.to_string(),
            mapping,
        }
    }

    /// Spectra without the key, or with an unseen value, are drawn grey.
    pub fn color_for(&self, value: Option<&HeaderValue>) -> Color32 {
        value
            .and_then(|v| self.mapping.get(v))
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}

use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Indicator;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Indicator colours
// ---------------------------------------------------------------------------

/// One stable colour per indicator, shared by every chart.
#[derive(Debug, Clone)]
pub struct IndicatorColors {
    mapping: BTreeMap<Indicator, Color32>,
    default_color: Color32,
}

impl Default for IndicatorColors {
    fn default() -> Self {
        let palette = generate_palette(Indicator::ALL.len());
        IndicatorColors {
            mapping: Indicator::ALL.into_iter().zip(palette).collect(),
            default_color: Color32::LIGHT_BLUE,
        }
    }
}

impl IndicatorColors {
    pub fn color_for(&self, indicator: Indicator) -> Color32 {
        self.mapping
            .get(&indicator)
            .copied()
            .unwrap_or(self.default_color)
    }
}

use std::collections::BTreeMap;

use eframe::egui::{Color32, Visuals};
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::config::Theme;

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
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Line colours
// ---------------------------------------------------------------------------

/// Maps every line name of the dataset to a distinct colour, so a line keeps
/// its colour whatever the filters are.
#[derive(Debug, Clone, Default)]
pub struct LineColors {
    mapping: BTreeMap<String, Color32>,
}

impl LineColors {
    pub fn new<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
        I::IntoIter: ExactSizeIterator,
    {
        let lines = lines.into_iter();
        let palette = generate_palette(lines.len());
        LineColors {
            mapping: lines.cloned().zip(palette).collect(),
        }
    }

    pub fn color_for(&self, line: &str) -> Color32 {
        self.mapping.get(line).copied().unwrap_or(Color32::GRAY)
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Ride / alight colours used by the split chart.
pub const RIDE_COLOR: Color32 = Color32::from_rgb(0x1f, 0x77, 0xb4);
pub const ALIGHT_COLOR: Color32 = Color32::from_rgb(0xff, 0x7f, 0x0e);

pub fn visuals(theme: Theme) -> Visuals {
    match theme {
        Theme::DarkBlue => {
            let mut v = Visuals::dark();
            v.selection.bg_fill = Color32::from_rgb(0x1f, 0x5f, 0xa8);
            v.hyperlink_color = Color32::from_rgb(0x6c, 0xb4, 0xee);
            v
        }
        Theme::Light => Visuals::light(),
    }
}

/// Low / high ends of the heatmap scale.
fn heat_endpoints(theme: Theme) -> (Srgb, Srgb) {
    match theme {
        Theme::DarkBlue => (Srgb::new(0.05, 0.09, 0.20), Srgb::new(0.45, 0.85, 1.0)),
        Theme::Light => (Srgb::new(0.97, 0.98, 1.0), Srgb::new(0.03, 0.19, 0.42)),
    }
}

/// Colour of a heatmap cell holding `value` when the largest cell is `max`.
pub fn heat_color(value: u64, max: u64, theme: Theme) -> Color32 {
    let t = if max == 0 {
        0.0
    } else {
        (value as f64 / max as f64).clamp(0.0, 1.0) as f32
    };
    let (low, high) = heat_endpoints(theme);
    let low: LinSrgb = low.into_linear();
    let high: LinSrgb = high.into_linear();
    to_color32(Srgb::from_linear(low.mix(high, t)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        assert_ne!(p[0], p[1]);
    }

    #[test]
    fn line_colors_are_stable_and_distinct() {
        let lines: Vec<String> = vec!["1호선".into(), "2호선".into(), "3호선".into()];
        let colors = LineColors::new(&lines);
        assert_ne!(colors.color_for("1호선"), colors.color_for("2호선"));
        assert_eq!(colors.color_for("9호선"), Color32::GRAY);
    }

    fn close(a: Color32, b: Color32) -> bool {
        let d = |x: u8, y: u8| x.abs_diff(y) <= 1;
        d(a.r(), b.r()) && d(a.g(), b.g()) && d(a.b(), b.b())
    }

    #[test]
    fn heat_scale_endpoints() {
        for theme in Theme::ALL {
            let (low, high) = heat_endpoints(theme);
            assert!(close(heat_color(0, 100, theme), to_color32(low)));
            assert!(close(heat_color(100, 100, theme), to_color32(high)));
            // all-zero matrix paints the low colour
            assert!(close(heat_color(0, 0, theme), to_color32(low)));
        }
    }
}

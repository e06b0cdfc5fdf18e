//! Style (colors and 3D layer parameters)

use serde::{Deserialize, Serialize};

/// RGBA color, components in 0-1
pub type Color = [f32; 4];

pub const WHITE: Color = [1.0, 1.0, 1.0, 1.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleData {
    pub id: String,
    /// Walls, center outline and player
    pub main_color: Color,
    /// Background sector colors, cycled per side
    pub colors: Vec<Color>,

    /// Number of depth layers drawn under the main layer
    #[serde(rename = "3d_depth")]
    pub three_d_depth: u32,
    #[serde(rename = "3d_skew")]
    pub three_d_skew: f32,
    #[serde(rename = "3d_spacing")]
    pub three_d_spacing: f32,
    #[serde(rename = "3d_darken_multiplier")]
    pub three_d_darken_mult: f32,
    #[serde(rename = "3d_alpha_multiplier")]
    pub three_d_alpha_mult: f32,
    #[serde(rename = "3d_alpha_falloff")]
    pub three_d_alpha_falloff: f32,
    #[serde(rename = "3d_pulse_min")]
    pub three_d_pulse_min: f32,
    #[serde(rename = "3d_pulse_max")]
    pub three_d_pulse_max: f32,
    /// Depth pulse change per second
    #[serde(rename = "3d_pulse_speed")]
    pub three_d_pulse_speed: f32,
}

impl Default for StyleData {
    fn default() -> Self {
        Self {
            id: String::new(),
            main_color: WHITE,
            colors: vec![[0.1, 0.1, 0.15, 1.0], [0.15, 0.15, 0.2, 1.0]],
            three_d_depth: 15,
            three_d_skew: 0.18,
            three_d_spacing: 1.0,
            three_d_darken_mult: 1.5,
            three_d_alpha_mult: 0.5,
            three_d_alpha_falloff: 3.0,
            three_d_pulse_min: 0.0,
            three_d_pulse_max: 3.2,
            three_d_pulse_speed: 0.6,
        }
    }
}

impl StyleData {
    /// Background color by index, wrapping around the palette
    pub fn color(&self, index: usize) -> Color {
        if self.colors.is_empty() {
            return self.main_color;
        }
        self.colors[index % self.colors.len()]
    }

    /// Color of depth layer `layer` (1-based), darkened and faded with depth
    pub fn depth_color(&self, layer: u32) -> Color {
        let [r, g, b, a] = self.main_color;
        let darken = self.three_d_darken_mult.max(1.0);
        let falloff = self.three_d_alpha_falloff.max(0.0) * layer as f32 / 255.0;
        let alpha = (a * self.three_d_alpha_mult - falloff).clamp(0.0, 1.0);
        [r / darken, g / darken, b / darken, alpha]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_wraps() {
        let style = StyleData {
            colors: vec![[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]],
            ..Default::default()
        };
        assert_eq!(style.color(0), style.color(2));
        assert_eq!(style.color(1), [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_empty_palette_falls_back_to_main() {
        let style = StyleData {
            colors: Vec::new(),
            ..Default::default()
        };
        assert_eq!(style.color(3), style.main_color);
    }

    #[test]
    fn test_depth_layers_fade() {
        let style = StyleData::default();
        assert!(style.depth_color(1)[3] >= style.depth_color(10)[3]);
        assert!(style.depth_color(1)[0] < style.main_color[0]);
    }
}

//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::data::Color;

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: Color) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn at(p: Vec2, color: Color) -> Self {
        Self::new(p.x, p.y, color)
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::from(self.position)
    }

    /// Raw bytes for upload to a GPU buffer
    pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}

/// Fixed colors not taken from the level style
pub mod colors {
    pub const FLASH: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const TEXT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const WARNING: [f32; 4] = [1.0, 0.3, 0.3, 1.0];
}

/// Luminance-preserving grayscale, alpha untouched
pub fn grayscale(color: [f32; 4]) -> [f32; 4] {
    let [r, g, b, a] = color;
    let l = 0.299 * r + 0.587 * g + 0.114 * b;
    [l, l, l, a]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        let verts = [Vertex::new(1.0, 2.0, colors::TEXT)];
        assert_eq!(Vertex::as_bytes(&verts).len(), 24);
    }

    #[test]
    fn test_grayscale() {
        let g = grayscale([1.0, 0.0, 0.0, 0.5]);
        assert_eq!(g[0], g[1]);
        assert_eq!(g[3], 0.5);
        assert_eq!(grayscale([1.0, 1.0, 1.0, 1.0])[0], 1.0);
    }
}

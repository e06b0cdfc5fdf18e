//! Shape generation for 2D primitives
//!
//! Angles are in degrees and go through the camera rotation passed in, so
//! callers work in world space.

use glam::Vec2;

use super::vertex::Vertex;
use crate::data::Color;
use crate::polar_to_cartesian;

/// Filled triangle fan sector between two angles
pub fn sector(radius: f32, from: f32, to: f32, rotation: f32, color: Color) -> Vec<Vertex> {
    let a = polar_to_cartesian(radius, from + rotation);
    let b = polar_to_cartesian(radius, to + rotation);
    vec![Vertex::at(Vec2::ZERO, color), Vertex::at(a, color), Vertex::at(b, color)]
}

/// Filled regular polygon with a vertex at angle 0
pub fn polygon(radius: f32, sides: u32, rotation: f32, color: Color) -> Vec<Vertex> {
    let span = 360.0 / sides.max(3) as f32;
    let mut vertices = Vec::with_capacity(sides as usize * 3);
    for i in 0..sides.max(3) {
        let from = i as f32 * span;
        vertices.extend(sector(radius, from, from + span, rotation, color));
    }
    vertices
}

/// Polygon outline of the given thickness, growing outward from `radius`
pub fn polygon_outline(radius: f32, thickness: f32, sides: u32, rotation: f32, color: Color) -> Vec<Vertex> {
    let span = 360.0 / sides.max(3) as f32;
    let mut vertices = Vec::with_capacity(sides as usize * 6);
    for i in 0..sides.max(3) {
        let from = i as f32 * span;
        vertices.extend(band(
            radius,
            radius,
            radius + thickness,
            from,
            from + span,
            rotation,
            color,
        ));
    }
    vertices
}

/// Quad between two angles and two radii; the inner edge may be skewed
/// by giving different inner radii at each end.
pub fn band(
    inner_from: f32,
    inner_to: f32,
    outer: f32,
    from: f32,
    to: f32,
    rotation: f32,
    color: Color,
) -> Vec<Vertex> {
    let i1 = polar_to_cartesian(inner_from, from + rotation);
    let i2 = polar_to_cartesian(inner_to, to + rotation);
    let o1 = polar_to_cartesian(outer, from + rotation);
    let o2 = polar_to_cartesian(outer, to + rotation);

    // Two triangles
    vec![
        Vertex::at(i1, color),
        Vertex::at(o1, color),
        Vertex::at(i2, color),
        Vertex::at(i2, color),
        Vertex::at(o1, color),
        Vertex::at(o2, color),
    ]
}

/// Isosceles triangle pointing away from the center
pub fn pointer(radius: f32, size: f32, angle: f32, half_width: f32, rotation: f32, color: Color) -> Vec<Vertex> {
    let tip = polar_to_cartesian(radius + size, angle + rotation);
    let left = polar_to_cartesian(radius, angle - half_width + rotation);
    let right = polar_to_cartesian(radius, angle + half_width + rotation);
    vec![Vertex::at(left, color), Vertex::at(tip, color), Vertex::at(right, color)]
}

/// Axis-aligned quad covering `[-half, half]`
pub fn fullscreen_quad(half: f32, color: Color) -> Vec<Vertex> {
    let (a, b, c, d) = (
        Vec2::new(-half, -half),
        Vec2::new(half, -half),
        Vec2::new(half, half),
        Vec2::new(-half, half),
    );
    vec![
        Vertex::at(a, color),
        Vertex::at(b, color),
        Vertex::at(c, color),
        Vertex::at(a, color),
        Vertex::at(c, color),
        Vertex::at(d, color),
    ]
}

/// Move every vertex by `offset`
pub fn translate(vertices: &mut [Vertex], offset: Vec2) {
    for v in vertices {
        let p = v.pos() + offset;
        v.position = p.into();
    }
}

//! Player / wall collision
//!
//! The death check is a collaborator seam: the update driver only asks a
//! [`CollisionCheck`] whether a point in polar space sits inside a wall. The
//! bundled [`SectorCollision`] treats each wall as the full angular sector of
//! its side between its inner and outer distance.

use super::wall::{SideGeometry, Wall};

/// Result of a collision check
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Index of the wall that was hit
    pub wall: Option<usize>,
    /// How far past the inner edge the point sits
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            wall: None,
            penetration: 0.0,
        }
    }
}

/// Decides whether the player at (`angle`, `radius`) overlaps a wall
pub trait CollisionCheck {
    fn check(&self, geometry: &SideGeometry, walls: &[Wall], angle: f32, radius: f32) -> CollisionResult;

    /// Death check after the walls moved. Also counts a wall that crossed
    /// `radius` during its last step.
    fn check_swept(&self, geometry: &SideGeometry, walls: &[Wall], angle: f32, radius: f32) -> CollisionResult {
        self.check(geometry, walls, angle, radius)
    }
}

/// Sector-based check: a wall occupies its whole side
#[derive(Debug, Clone, Copy, Default)]
pub struct SectorCollision;

impl SectorCollision {
    fn deepest(
        geometry: &SideGeometry,
        walls: &[Wall],
        angle: f32,
        radius: f32,
        covers: impl Fn(&Wall) -> bool,
    ) -> CollisionResult {
        let side = geometry.side_of(angle);
        walls
            .iter()
            .enumerate()
            .filter(|(_, wall)| wall.side == side && covers(wall))
            // Deepest overlap first so callers see the most relevant wall
            .max_by(|(_, a), (_, b)| {
                (radius - a.distance)
                    .partial_cmp(&(radius - b.distance))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(idx, wall)| CollisionResult {
                hit: true,
                wall: Some(idx),
                penetration: radius - wall.distance,
            })
            .unwrap_or_else(CollisionResult::miss)
    }
}

impl CollisionCheck for SectorCollision {
    fn check(&self, geometry: &SideGeometry, walls: &[Wall], angle: f32, radius: f32) -> CollisionResult {
        Self::deepest(geometry, walls, angle, radius, |wall| wall.covers(radius))
    }

    fn check_swept(&self, geometry: &SideGeometry, walls: &[Wall], angle: f32, radius: f32) -> CollisionResult {
        Self::deepest(geometry, walls, angle, radius, |wall| wall.swept_covers(radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_at(side: u32, distance: f32, thickness: f32) -> Wall {
        Wall {
            side,
            distance,
            thickness,
            speed: 0.0,
            travelled: 0.0,
        }
    }

    #[test]
    fn test_hit_on_same_side() {
        let geo = SideGeometry::new(6);
        let walls = vec![wall_at(1, 70.0, 40.0)];
        let result = SectorCollision.check(&geo, &walls, 90.0, 80.0);
        assert!(result.hit);
        assert_eq!(result.wall, Some(0));
        assert!((result.penetration - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_miss_on_other_side_or_radius() {
        let geo = SideGeometry::new(6);
        let walls = vec![wall_at(1, 70.0, 40.0)];
        assert!(!SectorCollision.check(&geo, &walls, 150.0, 80.0).hit);
        assert!(!SectorCollision.check(&geo, &walls, 90.0, 200.0).hit);
        assert_eq!(
            SectorCollision.check(&geo, &[], 90.0, 80.0),
            CollisionResult::miss()
        );
    }

    #[test]
    fn test_swept_check_catches_tunnelling_wall() {
        let geo = SideGeometry::new(6);
        let mut wall = wall_at(1, 120.0, 24.0);
        wall.speed = 480.0;
        wall.advance(0.13);
        let walls = vec![wall];
        assert!(!SectorCollision.check(&geo, &walls, 90.0, 80.0).hit);
        let swept = SectorCollision.check_swept(&geo, &walls, 90.0, 80.0);
        assert!(swept.hit);
        assert_eq!(swept.wall, Some(0));
    }

    #[test]
    fn test_deepest_wall_reported() {
        let geo = SideGeometry::new(4);
        let walls = vec![wall_at(0, 75.0, 40.0), wall_at(0, 60.0, 40.0)];
        let result = SectorCollision.check(&geo, &walls, 10.0, 80.0);
        assert_eq!(result.wall, Some(1));
    }
}

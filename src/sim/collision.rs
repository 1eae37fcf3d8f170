//! Collision detection
//!
//! Everything in the field is an axis-aligned box. Hitboxes are shrunk by a
//! fixed padding on all four sides so near misses feel fair.

use glam::Vec2;

use crate::consts::COLLISION_PADDING;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box from a top-left corner and a size
    pub fn from_rect(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    /// Move every edge inward by `padding`
    pub fn shrink(&self, padding: f32) -> Self {
        Self {
            min: self.min + Vec2::splat(padding),
            max: self.max - Vec2::splat(padding),
        }
    }

    /// Strict overlap; boxes that only touch do not collide
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Anything with a rectangular footprint in the field
pub trait Hitbox {
    fn pos(&self) -> Vec2;
    fn size(&self) -> Vec2;

    fn aabb(&self) -> Aabb {
        Aabb::from_rect(self.pos(), self.size())
    }
}

impl Hitbox for super::state::Runner {
    fn pos(&self) -> Vec2 {
        self.pos
    }
    fn size(&self) -> Vec2 {
        self.size
    }
}

impl Hitbox for super::state::Obstacle {
    fn pos(&self) -> Vec2 {
        self.pos
    }
    fn size(&self) -> Vec2 {
        self.size
    }
}

impl Hitbox for super::state::Pickup {
    fn pos(&self) -> Vec2 {
        self.pos
    }
    fn size(&self) -> Vec2 {
        self.size
    }
}

/// Check whether two entities collide using the padded hitboxes
pub fn collides(a: &impl Hitbox, b: &impl Hitbox) -> bool {
    a.aabb()
        .shrink(COLLISION_PADDING)
        .overlaps(&b.aabb().shrink(COLLISION_PADDING))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Obstacle, ObstacleKind, Runner};

    fn obstacle_at(x: f32, y: f32) -> Obstacle {
        let mut obs = Obstacle::spawn(1, ObstacleKind::Ground);
        obs.pos = Vec2::new(x, y);
        obs
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = Aabb::from_rect(Vec2::ZERO, Vec2::splat(10.0));
        let touching = Aabb::from_rect(Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        let inside = Aabb::from_rect(Vec2::new(9.0, 9.0), Vec2::splat(10.0));
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&inside));
    }

    #[test]
    fn test_padding_forgives_edge_contact() {
        let runner = Runner::default();
        // Runner spans x 50..94. Raw boxes overlap by 10 px, padded boxes do not.
        let obs = obstacle_at(84.0, runner.pos.y);
        assert!(runner.aabb().overlaps(&obs.aabb()));
        assert!(!collides(&runner, &obs));
    }

    #[test]
    fn test_padded_overlap_detected() {
        let runner = Runner::default();
        // 17 px of raw overlap leaves 1 px after 8 px padding on each box
        let obs = obstacle_at(77.0, runner.pos.y);
        assert!(collides(&runner, &obs));
    }

    #[test]
    fn test_vertical_clearance() {
        let mut runner = Runner::default();
        let obs = obstacle_at(60.0, ObstacleKind::Ground.spawn_y());
        assert!(collides(&runner, &obs));
        // Padded bottom edge lands exactly on the obstacle's padded top edge
        runner.pos.y = obs.pos.y + 16.0 - runner.size.y;
        assert!(!collides(&runner, &obs));
    }
}

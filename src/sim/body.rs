//! Moving sphere bodies: balls and straight-line projectiles

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::portal::PortalId;
use crate::consts::*;

/// Sphere-approximated moving body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
}

impl Body {
    pub fn new(position: Vec3, velocity: Vec3, radius: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
        }
    }

    /// Advance in a straight line, returning the previous position
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        let prev = self.position;
        self.position += self.velocity * dt;
        prev
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }
}

/// A ball currently inside a portal throat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transit {
    pub portal: PortalId,
    /// Time spent in the throat so far
    pub elapsed: f32,
}

/// A bouncing ball fired by the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub body: Body,
    /// Time left before the ball may use a portal again
    pub teleport_cooldown: f32,
    /// While set, ordinary wall and floor collision is skipped
    pub transit: Option<Transit>,
}

impl Ball {
    pub fn new(id: u32, position: Vec3, velocity: Vec3) -> Self {
        Self {
            id,
            body: Body::new(position, velocity, BALL_RADIUS),
            teleport_cooldown: 0.0,
            transit: None,
        }
    }

    pub fn in_transit(&self) -> bool {
        self.transit.is_some()
    }
}

/// What a straight-line projectile does on impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Portal gun shot; a wall hit relocates this portal
    PortalShot(PortalId),
    /// Enemy bolt; damages the player on contact
    EnemyBolt,
}

/// Non-bouncing projectile with a finite lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub body: Body,
    pub kind: ProjectileKind,
    /// Seconds left before the projectile expires
    pub life: f32,
}

impl Projectile {
    pub fn portal_shot(id: u32, portal: PortalId, origin: Vec3, direction: Vec3) -> Self {
        Self {
            id,
            body: Body::new(
                origin,
                direction * PORTAL_PROJECTILE_SPEED,
                PORTAL_PROJECTILE_RADIUS,
            ),
            kind: ProjectileKind::PortalShot(portal),
            life: PORTAL_PROJECTILE_LIFETIME,
        }
    }

    pub fn enemy_bolt(id: u32, origin: Vec3, direction: Vec3) -> Self {
        Self {
            id,
            body: Body::new(origin, direction * ENEMY_PROJECTILE_SPEED, ENEMY_PROJECTILE_RADIUS),
            kind: ProjectileKind::EnemyBolt,
            life: ENEMY_PROJECTILE_LIFETIME,
        }
    }
}

/// Push `item` and drop the oldest entries beyond `cap`
pub fn push_capped<T>(items: &mut Vec<T>, item: T, cap: usize) {
    items.push(item);
    if items.len() > cap {
        let excess = items.len() - cap;
        items.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_capped_evicts_oldest() {
        let mut items = Vec::new();
        for i in 0..5 {
            push_capped(&mut items, i, 3);
        }
        assert_eq!(items, vec![2, 3, 4]);
    }

    #[test]
    fn test_advance_returns_previous() {
        let mut body = Body::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 0.1);
        let prev = body.advance(0.5);
        assert_eq!(prev, Vec3::ZERO);
        assert_eq!(body.position, Vec3::new(0.5, 0.0, 0.0));
    }
}

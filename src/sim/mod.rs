//! Simulation module
//!
//! All gameplay logic lives here. The simulation is renderer-free:
//! - Seeded RNG only
//! - Stable iteration order (entities kept in spawn order)
//! - No rendering or platform dependencies beyond the portal's render slots

pub mod body;
pub mod collision;
pub mod enemy;
pub mod geometry;
pub mod placement;
pub mod player;
pub mod portal;
pub mod projectile;
pub mod state;
pub mod tick;
pub mod transform;

pub use body::{Ball, Body, Projectile, ProjectileKind};
pub use enemy::{DirectPath, Enemy, EnemyDirector};
pub use geometry::{Arena, Axis, FaceSide, Stage, WallHit, WorldQuery};
pub use placement::{PlacementCandidate, PlacementEffect, compute_placement};
pub use player::Player;
pub use portal::{Portal, PortalId, PortalPair, Pose, WallInfo};
pub use state::{GameEvent, GameMode, GamePhase, MenuAction, Weapon, World};
pub use tick::{FrameInput, update};
pub use transform::{Crossing, PortalTransform, ViewAngles, detect_crossing};

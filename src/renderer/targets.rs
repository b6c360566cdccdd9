//! Portal render targets and resolution policy

use crate::consts::*;

/// Opaque backend handle for an offscreen color target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u32);

/// Recursion level of a portal camera (L1 direct view, L3 two bounces)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    L1,
    L2,
    L3,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::L1, Level::L2, Level::L3];

    pub fn index(self) -> usize {
        match self {
            Level::L1 => 0,
            Level::L2 => 1,
            Level::L3 => 2,
        }
    }

    /// Distance band (full resolution at near, minimum at far)
    pub fn band(self) -> (f32, f32) {
        PORTAL_RT_BANDS[self.index()]
    }
}

/// A square offscreen target with its current side length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    pub handle: TargetHandle,
    pub size: u32,
    /// Rendered into at least once
    pub has_data: bool,
}

impl RenderTarget {
    pub fn new(handle: TargetHandle, size: u32) -> Self {
        Self {
            handle,
            size,
            has_data: false,
        }
    }

    /// Whether a resize to `size` is needed; records the new size
    pub fn needs_resize(&mut self, size: u32) -> bool {
        if self.size == size {
            return false;
        }
        self.size = size;
        true
    }
}

/// The four targets behind one portal surface
#[derive(Debug, Clone)]
pub struct PortalTargets {
    /// Scene from L3 with every portal surface hidden
    pub seed: RenderTarget,
    /// L3 view with surfaces showing the seed
    pub level3: RenderTarget,
    /// L2 view with surfaces showing L3
    pub level2: RenderTarget,
    /// L1 view, shown on the portal in the main frame
    pub final_view: RenderTarget,
}

impl PortalTargets {
    /// Freshest recursive image for a pass sampling L2: L2, else L3, else final
    pub fn level2_or_fallback(&self) -> TargetHandle {
        if self.level2.has_data {
            self.level2.handle
        } else {
            self.level3_or_fallback()
        }
    }

    /// Freshest recursive image for a pass sampling L3: L3, else final
    pub fn level3_or_fallback(&self) -> TargetHandle {
        if self.level3.has_data {
            self.level3.handle
        } else {
            self.final_view.handle
        }
    }
}

/// Largest side length for any portal target given the screen width and
/// the quality preset cap
pub fn resolution_cap(screen_width: u32, preset_max: u32) -> u32 {
    let preset_max = preset_max.clamp(PORTAL_RT_MIN, PORTAL_RT_MAX);
    screen_width.clamp(PORTAL_RT_MIN, preset_max)
}

/// Side length for a target at `level` whose camera is `distance` from the
/// destination portal center. Linear falloff from `cap` at the band's near
/// end to the minimum at its far end.
pub fn level_resolution(level: Level, distance: f32, cap: u32) -> u32 {
    let (near, far) = level.band();
    let cap = cap.clamp(PORTAL_RT_MIN, PORTAL_RT_MAX) as f32;
    let t = if distance.is_finite() {
        ((distance - near) / (far - near).max(1e-6)).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let size = cap + (PORTAL_RT_MIN as f32 - cap) * t;
    (size.round() as u32).clamp(PORTAL_RT_MIN, PORTAL_RT_MAX)
}

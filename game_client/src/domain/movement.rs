// Frame-stepped submarine movement.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerPosition {
    pub x: f32,
    pub y: f32,
    pub rotation: f32, // radians, 0 = +X
}

/// Held movement keys. Only changed by discrete key transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementIntent {
    pub fn is_idle(&self) -> bool {
        !(self.forward || self.backward || self.left || self.right)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MovementConfig {
    pub speed: f32,              // stat speed for the current tier
    pub speed_scale: f32,        // applied before frame scaling
    pub reference_frame_ms: f32, // frame length speed is balanced for
    pub rotation_step: f32,      // radians per frame while turning

    pub min_coord: f32,
    pub max_coord: f32,
}

/// Advances `position` by one frame of `dt_ms` milliseconds.
///
/// Translation scales with elapsed time, rotation does not: a held turn key turns by
/// a fixed step every frame. An empty energy pool freezes the submarine entirely.
/// Returns true if the position changed.
pub fn step(
    position: &mut PlayerPosition,
    intent: &MovementIntent,
    energy_empty: bool,
    dt_ms: f32,
    cfg: MovementConfig,
) -> bool {
    if energy_empty || intent.is_idle() || !dt_ms.is_finite() || dt_ms < 0.0 {
        return false;
    }
    let before = *position;

    if intent.left {
        position.rotation -= cfg.rotation_step;
    }
    if intent.right {
        position.rotation += cfg.rotation_step;
    }

    let speed = cfg.speed * cfg.speed_scale * (dt_ms / cfg.reference_frame_ms);
    let dx = position.rotation.cos() * speed;
    let dy = position.rotation.sin() * speed;
    if intent.forward {
        position.x += dx;
        position.y += dy;
    }
    if intent.backward {
        position.x -= dx;
        position.y -= dy;
    }

    position.x = position.x.clamp(cfg.min_coord, cfg.max_coord);
    position.y = position.y.clamp(cfg.min_coord, cfg.max_coord);

    *position != before
}

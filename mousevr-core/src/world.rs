use serde::{Deserialize, Serialize};

/// World-space position; `y` is up
#[derive(Copy, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Display and motion-capture switches owned by the session
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub blanked: bool,
    pub motion_connected: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            blanked: true,
            motion_connected: false,
        }
    }
}

/// Capability provided by the rendering/physics layer
pub trait WorldAdapter {
    fn teleport_to_waypoint(&mut self, waypoint: &str);
    fn teleport(&mut self, position: Vec3);
    fn teleport_with_yaw(&mut self, position: Vec3, yaw_deg: f32);
    fn move_object(&mut self, name: &str, position: Vec3);
    fn position_of(&self, name: &str) -> Option<Vec3>;
    fn player_position(&self) -> Vec3;

    fn apply_display(&mut self, _display: &DisplayState) {}
}

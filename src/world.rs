use mousevr_core::{DisplayState, Vec3, WorldAdapter};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// In-memory stand-in for the renderer's world
#[derive(Debug, Clone)]
pub struct SimWorld {
    pub player: Vec3,
    pub yaw_deg: f32,
    pub display: DisplayState,
    objects: HashMap<String, Vec3>,
    waypoints: HashMap<String, Vec3>,
}

impl SimWorld {
    pub fn new() -> Self {
        let mut world = Self {
            player: Vec3::default(),
            yaw_deg: 0.0,
            display: DisplayState::default(),
            objects: HashMap::new(),
            waypoints: HashMap::new(),
        };
        world.objects.insert("cue".to_string(), Vec3::new(0.0, -2.0, 0.0));
        world.waypoints.insert("0".to_string(), Vec3::default());
        world
    }

    pub fn with_waypoint(mut self, name: &str, position: Vec3) -> Self {
        self.waypoints.insert(name.to_string(), position);
        self
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldAdapter for SimWorld {
    fn teleport_to_waypoint(&mut self, waypoint: &str) {
        match self.waypoints.get(waypoint) {
            Some(position) => {
                self.player = *position;
                info!(waypoint, "player teleported");
            }
            None => warn!(waypoint, "unknown waypoint"),
        }
    }

    fn teleport(&mut self, position: Vec3) {
        self.player = position;
        debug!(?position, "player teleported");
    }

    fn teleport_with_yaw(&mut self, position: Vec3, yaw_deg: f32) {
        self.player = position;
        self.yaw_deg = yaw_deg;
        debug!(?position, yaw_deg, "player teleported");
    }

    fn move_object(&mut self, name: &str, position: Vec3) {
        match self.objects.get_mut(name) {
            Some(current) => *current = position,
            None => warn!(name, "unknown object"),
        }
    }

    fn position_of(&self, name: &str) -> Option<Vec3> {
        self.objects.get(name).copied()
    }

    fn player_position(&self) -> Vec3 {
        self.player
    }

    fn apply_display(&mut self, display: &DisplayState) {
        self.display = *display;
    }
}

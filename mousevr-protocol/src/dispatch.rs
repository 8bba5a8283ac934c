use crate::command::{parse_command, sanitize, Command};
use crate::error::{ProtocolError, Result};
use mousevr_core::{Vec3, WorldAdapter};
use tracing::{debug, warn};

/// Session-level operations reachable from the protocol
pub trait Console {
    fn toggle_motion(&mut self);
    fn toggle_blanking(&mut self);
    fn blank_display(&mut self, blank: bool);
    fn reward(&mut self);
    fn quit(&mut self);
    /// Writes a reply on the channel's outbound path
    fn reply(&mut self, payload: &[u8]);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: u64,
    /// Recognised commands whose arguments matched no shape
    pub ignored: u64,
    pub parse_failures: u64,
    pub failures: u64,
}

fn millimeters(v: f32) -> i64 {
    (v as f64 * 1000.0).round() as i64
}

/// `"<x_mm>,<z_mm>,<y_mm>"`
pub fn format_position(p: Vec3) -> String {
    format!("{},{},{}", millimeters(p.x), millimeters(p.z), millimeters(p.y))
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    pub debug: bool,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(debug: bool) -> Self {
        Self {
            debug,
            stats: DispatchStats::default(),
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Splits a channel payload on newlines and dispatches each command in
    /// order. Failures are logged and never interrupt the batch.
    pub fn dispatch_payload(
        &mut self,
        payload: &[u8],
        world: &mut dyn WorldAdapter,
        console: &mut dyn Console,
    ) {
        let text = String::from_utf8_lossy(payload);
        for line in text.split('\n').filter_map(sanitize) {
            if self.debug {
                debug!("Socket Message: {}", line);
            }
            if let Err(e) = self.dispatch_line(&line, world, console) {
                warn!("command dispatch failed: {}", e);
            }
        }
    }

    /// Dispatches one sanitised line
    pub fn dispatch_line(
        &mut self,
        line: &str,
        world: &mut dyn WorldAdapter,
        console: &mut dyn Console,
    ) -> Result<Option<Command>> {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => {
                self.stats.ignored += 1;
                return Ok(None);
            }
            Err(e) => {
                match e {
                    ProtocolError::Unrecognized(_) => self.stats.parse_failures += 1,
                    _ => self.stats.failures += 1,
                }
                return Err(e);
            }
        };

        if let Err(e) = execute(&command, world, console) {
            self.stats.failures += 1;
            return Err(e);
        }
        self.stats.dispatched += 1;
        Ok(Some(command))
    }
}

fn execute(command: &Command, world: &mut dyn WorldAdapter, console: &mut dyn Console) -> Result<()> {
    match command {
        Command::ToggleMotion => console.toggle_motion(),
        Command::ToggleBlanking => console.toggle_blanking(),
        Command::BlankDisplay(blank) => console.blank_display(*blank),
        Command::TeleportToWaypoint(name) => world.teleport_to_waypoint(name),
        Command::Teleport(position) => world.teleport(*position),
        Command::TeleportWithYaw(position, yaw) => world.teleport_with_yaw(*position, *yaw),
        Command::MoveObject { name, position } => world.move_object(name, *position),
        Command::GetPosition(name) => {
            let position = world
                .position_of(name)
                .ok_or_else(|| ProtocolError::UnknownObject(name.clone()))?;
            console.reply(format_position(position).as_bytes());
        }
        Command::Reward => console.reward(),
        Command::Quit => console.quit(),
    }
    Ok(())
}

pub mod log;
pub mod session;
pub mod state;
pub mod trial;
pub mod world;
pub mod zone;

pub use log::{LogEntry, LogSink, ParameterLog, TrialLog};
pub use session::{SessionParameters, TaskKind};
pub use state::{Choice, TrialState};
pub use trial::TrialRecord;
pub use world::{DisplayState, Vec3, WorldAdapter};
pub use zone::ZoneEvent;

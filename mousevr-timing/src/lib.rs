pub mod scheduler;
pub mod timer;

pub use scheduler::DeferredQueue;
pub use timer::{HighPrecisionTimer, ManualTimer, TickStats, Timer};

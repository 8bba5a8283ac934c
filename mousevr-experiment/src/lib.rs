pub mod action;
pub mod config;
pub mod delay;
pub mod state;
pub use action::{Deferred, TaskAction};
pub use config::TaskTiming;
pub use delay::{delay_from_uniform, sample_delay};
pub use state::TrialController;

//! Text command protocol spoken by the external renderer.
//!
//! Commands look like `namespace.method(args)`, one per line. Lines are
//! sanitised, split into a [`Call`], matched against a fixed set of argument
//! shapes and turned into typed [`Command`]s that the [`Dispatcher`] runs.

pub mod command;
pub mod dispatch;
pub mod error;

pub use command::{parse_command, sanitize, tokenize, Arg, Call, Command};
pub use dispatch::{format_position, Console, DispatchStats, Dispatcher};
pub use error::ProtocolError;

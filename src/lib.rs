//! timetasker - a terminal Pomodoro timer with a durable completion log.
//!
//! - [`duration`]: `25m` / `1h30m` interval strings
//! - [`history`]: append-only log of completed intervals, persisted atomically
//! - [`timer`]: countdown state machine that records a completion at zero and
//!   then counts overtime
//! - [`config`] and [`paths`]: startup configuration and per-user directories

pub mod clock;
pub mod config;
pub mod duration;
pub mod error;
pub mod history;
pub mod paths;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, Overrides, Settings};
pub use duration::{format_clock, parse_duration};
pub use error::{ConfigError, DurationError, LogError, PathsError};
pub use history::{CompletionEvent, CompletionLog, CompletionSink};
pub use paths::{Platform, ProjectDirs};
pub use timer::{CountdownTimer, Direction, Tick, TimerState};

//! Pomodoro session control: a wall-clock driven focus/break state machine
//! with pluggable persistence and notification.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod notifier;
pub mod session;
pub mod stats;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigPatch, SessionConfig};
pub use controller::{SessionController, Wakeup};
pub use error::{ConfigError, StoreError};
pub use notifier::{DesktopNotifier, Notifier, NullNotifier};
pub use session::{Phase, Snapshot, Status};
pub use stats::Statistics;
pub use store::{JsonDirStore, KeyValueStore, MemoryStore, PersistedRecord, Persistence};

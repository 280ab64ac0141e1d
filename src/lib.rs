// Library surface for the binary and integration tests.
pub mod app_dirs;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod group;
pub mod language;
pub mod partition;
pub mod runtime;
pub mod sorting;
pub mod stats;
pub mod storage;
pub mod util;
pub mod wordset;

pub use engine::{AdaptiveEngine, Progress, TestResults, WordStatus, WordTyped};
pub use error::{PracticeError, Result};
pub use events::{EventBus, PracticeEvent, UiHandle};
pub use stats::{WordRecord, WordStatsStore, WordSummary};
pub use storage::{JsonFileBackend, MemoryBackend, SqliteBackend, StatsBackend};
pub use wordset::Wordset;

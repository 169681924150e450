//! # Sadhana Core Library
//!
//! Core logic for the guided chakra breath-retention round: seven cycles of
//! breathing, breath retention and meditation, one per chakra, followed by a
//! summary that is persisted to the collaborator server.
//!
//! ## Architecture
//!
//! - **Session controller**: a single owned state machine. Front ends feed it
//!   user operations, platform notifications and periodic `tick()` calls, and
//!   drain the `Event`s and `Outbound` requests it produces
//! - **Platform**: traits for the clock, the media channel and the screen
//!   wake lock, injected by the front end
//! - **Audio**: sequencer for the guided clips plus the instruction and
//!   retention-focus cues
//! - **API**: HTTP client for login, session persistence and statistics
//! - **Storage**: TOML-based front-end configuration
//!
//! ## Key Components
//!
//! - [`SessionController`]: drives a round
//! - [`ApiClient`]: collaborator endpoints
//! - [`Config`]: application configuration management

pub mod api;
pub mod audio;
pub mod error;
pub mod events;
pub mod platform;
pub mod round;
pub mod session;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod wake_lock;

pub use api::{ApiClient, ApiError, SaveSessionRequest, SavedSession};
pub use error::ConfigError;
pub use events::Event;
pub use round::{ChakraStage, ROUND, STAGE_COUNT};
pub use session::{
    CurrentUser, Outbound, Phase, Platform, SaveStatus, SessionController, SessionSnapshot,
    TransitionError, UserType,
};
pub use stats::UserStats;
pub use storage::Config;
pub use timer::RetentionTimer;
pub use wake_lock::{WakeLockChange, WakeLockManager};

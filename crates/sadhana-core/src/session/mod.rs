//! Session domain: phases, users and the controller that drives a round.

mod controller;
mod phase;
mod user;


pub use controller::{
    Outbound, Platform, SaveStatus, SessionController, SessionSnapshot, StatsView,
};
pub use phase::{
    Phase, PhaseEvent, SessionState, Transition, TransitionError, TransitionLock,
    TRANSITION_COOLDOWN_MS,
};
pub use user::{CurrentUser, RetentionHistoryItem, UserType};

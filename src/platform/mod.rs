//! Platform abstraction layer
//!
//! Handles the collaborators outside the simulation:
//! - Activity signal (polled status that pauses and resumes the run)
//! - Pointer drag and key input

pub mod activity;
pub mod input;

pub use activity::{ActivityMonitor, ActivitySource, ActivityStatus, FixedSource, PollError, StatusFileSource};
pub use input::{InputState, PointerDrag};

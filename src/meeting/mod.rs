//! Meeting session orchestration.

pub mod machine;
pub mod status;

pub use machine::{
    MachineOptions, MeetingMachine, MeetingOutcome, MeetingStartResult, ToggleOutcome,
};
pub use status::{MeetingPhase, MeetingState, MeetingStatusHandle, StatusListener};

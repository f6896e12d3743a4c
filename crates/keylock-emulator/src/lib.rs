//! Keylock emulator crate: the access controller itself.
//!
//! This crate contains the foreground access state machine, the emergency
//! handler, the actuator bus that arbitrates between them, and a virtual LCD
//! for running the whole system on a host.

pub mod bus;
pub mod controller;
pub mod display;
pub mod emergency;
pub mod state_machine;
pub mod stats;
pub mod system;

pub use bus::{ActuatorBus, MaskGuard};
pub use controller::{AccessController, AttemptOutcome};
pub use display::{DisplayHandle, VirtualDisplay, VirtualDisplayBuilder, truncate_text};
pub use emergency::{EmergencyHandler, EmergencyOutcome};
pub use state_machine::{
    AccessState, REPORTED_TRANSITIONS, StateMachine, StateMachineBuilder, StateReport,
    StateTransition,
};
pub use stats::{StatEvent, Statistics, StatsSnapshot};
pub use system::KeylockSystem;

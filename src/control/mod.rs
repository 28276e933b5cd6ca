// src/control/mod.rs

mod state_machine;

pub use state_machine::{ApproachController, ControllerState};

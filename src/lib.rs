//! RBMK-1000 Control Panel Library
//!
//! Simulation core for an RBMK-1000 control panel: control rods, coolant
//! pumps, AZ-5/MUF scrams and SAOR emergency cooling driving a coarse
//! reactivity/temperature model. Rendering and audio live outside the crate.

pub mod alarms;
pub mod clock;
pub mod commands;
pub mod config;
pub mod controls;
pub mod reactor;
pub mod rods;

pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{dispatch, Command, PanelSnapshot};
pub use config::PanelConfig;
pub use reactor::{ReactorSimulator, ReactorState};

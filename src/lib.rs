//! Keyscript: a HID keyboard that plays back a compiled-in keystroke script.
//!
//! The core (playback, timing, calibration, request handling) is plain `no_std` logic
//! that talks to the hardware through a handful of traits. The `board` module wires those
//! traits to the Tiny2040 and is only built with the `board` feature.

#![cfg_attr(not(test), no_std)]

pub mod calibrate;
pub mod flash;
pub mod keys;
pub mod playback;
pub mod report;
pub mod requests;
pub mod script;
pub mod settings;
pub mod timing;
pub mod usb;

#[cfg(feature = "board")]
pub mod board;

pub use playback::{Emission, PlaybackConfig, Player, State};
pub use report::{Report, ReportBuilder};
pub use script::{Script, ScriptEntry};
pub use timing::DelayCounter;

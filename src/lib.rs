//! # i2s-chime
//!
//! Tone and melody driver for a serial-audio (I2S) class-D amplifier
//! such as the MAX98357A.
//!
//! ## Architecture
//!
//! The driver owns the whole playback path:
//! - Peripheral bring-up and teardown ([`ToneDriver::initialize`],
//!   [`ToneDriver::suspend`], [`ToneDriver::resume`])
//! - Sine synthesis into a fixed 256-sample chunk buffer
//! - Chunked transfer with bounded completion waits
//!
//! Hardware access goes through the traits in [`hal`]; the ESP-IDF
//! backend lives behind `cfg(target_os = "espidf")` and host tests run
//! against the recording mock in [`hal::mock`].
//!
//! All playback calls are synchronous and block for the real-time
//! duration of the audio. There is one driver instance per board; the
//! driver provides no locking against concurrent suspend/resume.

#![cfg_attr(not(test), no_std)]

pub mod audio;
pub mod config;
pub mod driver;
pub mod fault;
pub mod hal;
pub mod logging;
pub mod transfer;

pub use driver::{PeriphState, ToneDriver};
pub use fault::{FaultCode, FaultSnapshot, FaultState};
pub use hal::{I2sBus, Mode, PinConfig, Platform, Signal};
pub use logging::{LogLevel, LogRing};

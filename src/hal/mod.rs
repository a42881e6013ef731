//! Hardware abstraction for the serial-audio peripheral.
//!
//! Thin traits only; all sequencing logic (bring-up order, bounded
//! waits, chunk scheduling) lives in the core modules. The ESP-IDF
//! backend is in [`esp32`], host tests use [`mock`].

#[cfg(target_os = "espidf")]
pub mod esp32;
pub mod mock;

use crate::config::{FRAME_RATIO, MCK_DIVIDER};

/// Completion signals raised by the peripheral.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    /// High-frequency clock source is running.
    ClockStarted,
    /// The transfer engine has fetched the bound buffer.
    FrameFetched,
    /// The transfer engine has come to a stop.
    Stopped,
}

/// Signal-pin bindings for the serial audio transport.
///
/// Data-in is never bound; the receive path is unused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    /// Bit clock output (BCLK).
    pub bclk: u8,
    /// Word-select clock output (LRCLK).
    pub lrclk: u8,
    /// Serial data out (DIN on the amplifier).
    pub dout: u8,
}

/// Peripheral mode parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mode {
    /// Clock master (the peripheral drives BCLK and LRCLK).
    pub master: bool,
    /// Transmit-only; the receive lane stays disabled.
    pub tx_only: bool,
    /// Sample width in bits.
    pub sample_bits: u8,
    /// Duplicate the mono source onto the single active lane.
    pub mono_duplicate: bool,
    /// Master clock divider from the high-frequency clock.
    pub mck_divider: u32,
    /// MCK cycles per LRCK period.
    pub frame_ratio: u32,
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            master: true,
            tx_only: true,
            sample_bits: 16,
            mono_duplicate: true,
            mck_divider: MCK_DIVIDER,
            frame_ratio: FRAME_RATIO,
        }
    }
}

/// Register-level surface of the serial audio peripheral.
///
/// Implementations own the pins they bind: callers must never
/// reconfigure bound pins as generic digital I/O.
pub trait I2sBus {
    /// Request the high-frequency clock source; completion is reported
    /// via [`Signal::ClockStarted`].
    fn start_clock(&mut self);

    /// Route the transport signals to the given pins.
    fn bind_pins(&mut self, pins: &PinConfig);

    /// Disconnect every signal pin, dropping any stale routing.
    fn unbind_pins(&mut self);

    /// Apply mode parameters. Only meaningful while disabled.
    fn set_mode(&mut self, mode: &Mode);

    /// Enable the peripheral.
    fn enable(&mut self);

    /// Disable the peripheral.
    fn disable(&mut self);

    /// Mask all peripheral-generated interrupts; the driver polls.
    fn mask_interrupts(&mut self);

    /// Clear a pending completion signal.
    fn clear_signal(&mut self, signal: Signal);

    /// Poll a completion signal.
    fn signal(&self, signal: Signal) -> bool;

    /// Bind the sample buffer and word count to the transfer engine.
    fn set_transfer(&mut self, samples: &[i16]);

    /// Issue the start command. Returns once the command is issued.
    fn start(&mut self);

    /// Issue the stop command. Completion is reported via
    /// [`Signal::Stopped`].
    fn stop(&mut self);
}

/// Collaborators the driver needs from its environment: a millisecond
/// clock, a blocking sleep, and a cooperative yield.
pub trait Platform {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block for at least `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Cede the processor to other pending work.
    fn yield_now(&mut self);
}

/// Poll `signal` until it is raised or `timeout_ms` elapses, yielding
/// between polls. Returns `false` on timeout.
pub fn wait_signal<B, P>(bus: &B, platform: &mut P, signal: Signal, timeout_ms: u32) -> bool
where
    B: I2sBus,
    P: Platform,
{
    let deadline = platform.now_ms() + timeout_ms as u64;
    while !bus.signal(signal) {
        if platform.now_ms() > deadline {
            return false;
        }
        platform.yield_now();
    }
    true
}

/// Stand-in pin type for boards without an amplifier enable line.
///
/// Never instantiated by the driver; it only satisfies the pin type
/// parameter of [`crate::ToneDriver::without_amp`].
pub struct NullAmp;

impl embedded_hal::digital::ErrorType for NullAmp {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for NullAmp {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

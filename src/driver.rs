//! Tone playback driver: peripheral lifecycle and the chunk loop.
//!
//! One `ToneDriver` per board. It owns the bus, the chunk buffer, and
//! both state machines (peripheral lifecycle, playback), and it is the
//! only writer of either. Playback calls are synchronous: they return
//! after the last chunk has been played out.
//!
//! Suspend/resume must not be called while a tone is in progress; the
//! driver does not arbitrate that (single foreground task assumed).

use embedded_hal::digital::OutputPin;

use crate::audio::{synth, AudioBuffer};
use crate::config::{
    AMP_STARTUP_DELAY_MS, BCLK_PIN, DOUT_PIN, LRCLK_PIN, MAX_TONE_DURATION_MS, NOTE_GAP_MS,
    SAMPLE_RATE_HZ, SETTLE_DELAY_MS,
};
use crate::fault::{FaultCode, FaultSnapshot, FaultState};
use crate::hal::{I2sBus, Mode, NullAmp, PinConfig, Platform, Signal};
use crate::logging::LogRing;
use crate::transfer;
use crate::{drv_debug, drv_error, drv_info, drv_warn};

/// Peripheral lifecycle state.
///
/// `Uninitialized` is only left through [`ToneDriver::initialize`];
/// suspend/resume move between the other two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriphState {
    Uninitialized,
    Configured,
    Suspended,
}

/// Tone and melody driver for a serial-audio class-D amplifier.
pub struct ToneDriver<B, P, A> {
    bus: B,
    platform: P,
    amp: Option<A>,
    buffer: AudioBuffer,
    periph: PeriphState,
    playing: bool,
    faults: FaultState,
    log: LogRing,
    synth_diag_done: bool,
}

impl<B, P> ToneDriver<B, P, NullAmp>
where
    B: I2sBus,
    P: Platform,
{
    /// Build a driver for a board without an amplifier enable line.
    ///
    /// Valid, but bring-up will warn: the amplifier must be enabled
    /// externally or it stays muted.
    pub fn without_amp(bus: B, platform: P) -> Self {
        Self::build(bus, platform, None)
    }
}

impl<B, P, A> ToneDriver<B, P, A>
where
    B: I2sBus,
    P: Platform,
    A: OutputPin,
{
    /// Build a driver owning the amplifier enable line.
    pub fn new(bus: B, platform: P, amp: A) -> Self {
        Self::build(bus, platform, Some(amp))
    }

    fn build(bus: B, platform: P, amp: Option<A>) -> Self {
        Self {
            bus,
            platform,
            amp,
            buffer: AudioBuffer::new(),
            periph: PeriphState::Uninitialized,
            playing: false,
            faults: FaultState::new(),
            log: LogRing::new(),
            synth_diag_done: false,
        }
    }

    /// Bring the peripheral from power-off to clocked-and-enabled.
    ///
    /// Idempotent: calling on a configured driver is a no-op success.
    /// This layer cannot detect wiring faults; success means the
    /// enable step completed. The bound pins belong to the peripheral
    /// from here on.
    pub fn initialize(&mut self) -> bool {
        if self.periph == PeriphState::Configured {
            drv_info!(self.log, self.platform.now_ms(), "already configured");
            return true;
        }

        drv_info!(self.log, self.platform.now_ms(), "configuring audio peripheral");
        self.configure_peripheral();
        self.power_amplifier(true);
        self.periph = PeriphState::Configured;

        drv_info!(
            self.log,
            self.platform.now_ms(),
            "audio output ready, sample rate {} Hz",
            SAMPLE_RATE_HZ
        );
        true
    }

    /// The bring-up sequence. Order matters: stale pin routing or a
    /// pending completion signal from a previous boot must be gone
    /// before the engine is reconfigured.
    fn configure_peripheral(&mut self) {
        // The bit clock divides the high-frequency clock; wait until
        // that source reports running. No timeout: the clock source is
        // unconditionally available hardware.
        self.bus.clear_signal(Signal::ClockStarted);
        self.bus.start_clock();
        while !self.bus.signal(Signal::ClockStarted) {
            self.platform.yield_now();
        }
        self.bus.clear_signal(Signal::ClockStarted);

        self.bus.disable();
        self.platform.delay_ms(SETTLE_DELAY_MS);

        self.bus.unbind_pins();
        self.bus.clear_signal(Signal::FrameFetched);
        self.bus.clear_signal(Signal::Stopped);
        self.bus.mask_interrupts();
        self.platform.delay_ms(SETTLE_DELAY_MS);

        self.bus.bind_pins(&PinConfig {
            bclk: BCLK_PIN,
            lrclk: LRCLK_PIN,
            dout: DOUT_PIN,
        });
        self.bus.set_mode(&Mode::default());

        self.bus.enable();
        self.platform.delay_ms(SETTLE_DELAY_MS);
    }

    /// Drive the amplifier enable line, if present.
    fn power_amplifier(&mut self, on: bool) {
        let now = self.platform.now_ms();
        match self.amp.as_mut() {
            Some(pin) => {
                let result = if on { pin.set_high() } else { pin.set_low() };
                if result.is_err() {
                    drv_warn!(self.log, now, "amplifier enable line write failed");
                } else if on {
                    self.platform.delay_ms(AMP_STARTUP_DELAY_MS);
                }
            }
            None if on => {
                drv_warn!(
                    self.log,
                    now,
                    "no amplifier enable line configured, amplifier may stay muted"
                );
            }
            None => {}
        }
    }

    /// Synthesize and play a single sine tone, blocking until done.
    ///
    /// Duration is clamped to 1..=`MAX_TONE_DURATION_MS`; volume beyond
    /// 100 is clamped to full scale. Rejected with a diagnostic (and no
    /// hardware access) unless the peripheral is configured.
    pub fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32, volume: u8) {
        if self.periph != PeriphState::Configured {
            self.faults.set(FaultCode::NotConfigured, frequency_hz);
            drv_error!(
                self.log,
                self.platform.now_ms(),
                "play_tone rejected: peripheral not configured"
            );
            return;
        }

        let duration_ms = duration_ms.clamp(1, MAX_TONE_DURATION_MS);
        let mut remaining = (SAMPLE_RATE_HZ as u64 * duration_ms as u64 / 1000) as usize;

        drv_debug!(
            self.log,
            self.platform.now_ms(),
            "tone {} Hz, {} ms, volume {}",
            frequency_hz,
            duration_ms,
            volume
        );

        self.playing = true;

        while remaining > 0 {
            let chunk = remaining.min(self.buffer.capacity());
            let written = synth::fill_sine(
                self.buffer.as_mut_slice(),
                frequency_hz,
                chunk,
                volume,
            );
            self.emit_synth_diag(volume, written);

            transfer::start(&mut self.bus, &self.buffer.as_slice()[..written]);
            transfer::await_completion(
                &mut self.bus,
                &mut self.platform,
                &self.faults,
                &self.log,
                written,
            );

            remaining -= written;
        }

        self.playing = false;
    }

    /// One-time volume-to-amplitude report on the first synthesis of
    /// the driver's lifetime.
    fn emit_synth_diag(&mut self, volume: u8, written: usize) {
        if self.synth_diag_done {
            return;
        }
        self.synth_diag_done = true;

        let amplitude = synth::amplitude_for(volume);
        let peak = synth::peak_magnitude(&self.buffer.as_slice()[..written]);
        drv_debug!(
            self.log,
            self.platform.now_ms(),
            "synth: volume {} -> amplitude {}, chunk peak {}",
            volume,
            amplitude,
            peak
        );
    }

    /// Play tones back to back, with a fixed silent gap between notes.
    ///
    /// `frequencies` and `durations` are parallel slices sharing one
    /// volume. A length mismatch plays the shorter prefix and warns.
    pub fn play_melody(&mut self, frequencies: &[u32], durations: &[u32], volume: u8) {
        if frequencies.len() != durations.len() {
            drv_warn!(
                self.log,
                self.platform.now_ms(),
                "melody length mismatch: {} frequencies, {} durations",
                frequencies.len(),
                durations.len()
            );
        }

        let count = frequencies.len().min(durations.len());
        for (i, (&frequency_hz, &duration_ms)) in
            frequencies.iter().zip(durations).enumerate()
        {
            self.play_tone(frequency_hz, duration_ms, volume);
            if i + 1 < count {
                self.platform.delay_ms(NOTE_GAP_MS);
            }
        }
    }

    /// Stop the transfer engine and wait for it to report stopped.
    ///
    /// No timeout on this wait, unlike the per-chunk handshakes: stop
    /// is the recovery path, and returning early from it would leave
    /// the engine state unknown. Yields while polling.
    pub fn stop(&mut self) {
        if self.periph != PeriphState::Configured {
            return;
        }

        self.bus.stop();
        while !self.bus.signal(Signal::Stopped) {
            self.platform.yield_now();
        }

        self.playing = false;
    }

    /// Power down for suspend: stop playback, disable the peripheral,
    /// drop the amplifier enable line.
    pub fn suspend(&mut self) {
        if self.periph != PeriphState::Configured {
            return;
        }

        drv_info!(self.log, self.platform.now_ms(), "suspending audio output");

        self.stop();
        self.bus.disable();
        self.power_amplifier(false);

        self.periph = PeriphState::Suspended;
    }

    /// Undo [`suspend`](Self::suspend): raise the amplifier enable
    /// line, re-enable the peripheral.
    ///
    /// Pin routing and mode survive suspension (only the enable bit
    /// was toggled), so no reconfiguration happens here.
    pub fn resume(&mut self) {
        if self.periph != PeriphState::Suspended {
            return;
        }

        drv_info!(self.log, self.platform.now_ms(), "resuming audio output");

        self.power_amplifier(true);
        self.bus.enable();

        self.periph = PeriphState::Configured;
    }

    /// Whether a tone or melody call is currently streaming.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current lifecycle state.
    #[inline]
    pub fn periph_state(&self) -> PeriphState {
        self.periph
    }

    /// Snapshot of the fault latch.
    #[inline]
    pub fn faults(&self) -> FaultSnapshot {
        self.faults.snapshot()
    }

    /// Diagnostic ring, for draining to a console or UART.
    #[inline]
    pub fn log(&self) -> &LogRing {
        &self.log
    }

    /// Tear the driver apart, returning the hardware it owned.
    pub fn release(self) -> (B, P, Option<A>) {
        (self.bus, self.platform, self.amp)
    }
}

//! Host-side test doubles for the HAL traits.
//!
//! [`MockBus`] records every bus call in order and raises completion
//! signals according to its knobs, so tests can script both the happy
//! path and the timeout paths. [`MockPlatform`] runs a virtual clock
//! that advances on every yield, which lets bounded waits expire
//! without wall-clock time passing.

use heapless::Vec;

use super::{I2sBus, Mode, PinConfig, Platform, Signal};

/// One recorded bus call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    StartClock,
    BindPins,
    UnbindPins,
    SetMode,
    Enable,
    Disable,
    MaskIrqs,
    ClearSignal(Signal),
    SetTransfer(usize),
    Start,
    Stop,
}

fn signal_index(signal: Signal) -> usize {
    match signal {
        Signal::ClockStarted => 0,
        Signal::FrameFetched => 1,
        Signal::Stopped => 2,
    }
}

/// Recording bus double.
pub struct MockBus {
    /// Every call, in order. Saturates silently when full.
    pub ops: Vec<Op, 1024>,
    /// Word count of every transfer binding, in order.
    pub transfers: Vec<usize, 256>,
    /// Raise [`Signal::FrameFetched`] as soon as `start()` is issued.
    pub fetch_on_start: bool,
    /// Raise [`Signal::Stopped`] as soon as `stop()` is issued.
    pub stop_on_stop: bool,
    /// Last mode applied via `set_mode`.
    pub mode: Option<Mode>,
    /// Last pin binding, `None` after `unbind_pins`.
    pub pins: Option<PinConfig>,
    signals: [bool; 3],
}

impl MockBus {
    /// New bus with compliant hardware (signals raised immediately).
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            transfers: Vec::new(),
            fetch_on_start: true,
            stop_on_stop: true,
            mode: None,
            pins: None,
            signals: [false; 3],
        }
    }

    fn record(&mut self, op: Op) {
        let _ = self.ops.push(op);
    }

    /// Number of recorded calls matching `op` exactly.
    pub fn count(&self, op: Op) -> usize {
        self.ops.iter().filter(|&&o| o == op).count()
    }

    /// Number of issued start commands.
    pub fn starts(&self) -> usize {
        self.count(Op::Start)
    }

    /// Number of issued stop commands.
    pub fn stops(&self) -> usize {
        self.count(Op::Stop)
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl I2sBus for MockBus {
    fn start_clock(&mut self) {
        self.record(Op::StartClock);
        // The high-frequency clock is unconditionally available.
        self.signals[signal_index(Signal::ClockStarted)] = true;
    }

    fn bind_pins(&mut self, pins: &PinConfig) {
        self.record(Op::BindPins);
        self.pins = Some(*pins);
    }

    fn unbind_pins(&mut self) {
        self.record(Op::UnbindPins);
        self.pins = None;
    }

    fn set_mode(&mut self, mode: &Mode) {
        self.record(Op::SetMode);
        self.mode = Some(*mode);
    }

    fn enable(&mut self) {
        self.record(Op::Enable);
    }

    fn disable(&mut self) {
        self.record(Op::Disable);
    }

    fn mask_interrupts(&mut self) {
        self.record(Op::MaskIrqs);
    }

    fn clear_signal(&mut self, signal: Signal) {
        self.record(Op::ClearSignal(signal));
        self.signals[signal_index(signal)] = false;
    }

    fn signal(&self, signal: Signal) -> bool {
        self.signals[signal_index(signal)]
    }

    fn set_transfer(&mut self, samples: &[i16]) {
        self.record(Op::SetTransfer(samples.len()));
        let _ = self.transfers.push(samples.len());
    }

    fn start(&mut self) {
        self.record(Op::Start);
        if self.fetch_on_start {
            self.signals[signal_index(Signal::FrameFetched)] = true;
        }
    }

    fn stop(&mut self) {
        self.record(Op::Stop);
        if self.stop_on_stop {
            self.signals[signal_index(Signal::Stopped)] = true;
        }
    }
}

/// Virtual-clock platform double.
pub struct MockPlatform {
    now: u64,
    /// Every `delay_ms` call, in order.
    pub delays: Vec<u32, 1024>,
    /// Total yields observed.
    pub yields: u32,
    /// Virtual milliseconds per yield, so deadline loops terminate.
    pub yield_step_ms: u32,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            now: 0,
            delays: Vec::new(),
            yields: 0,
            yield_step_ms: 1,
        }
    }

    /// Sum of all requested delays, in ms.
    pub fn slept_ms(&self) -> u64 {
        self.delays.iter().map(|&ms| ms as u64).sum()
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for MockPlatform {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now += ms as u64;
        let _ = self.delays.push(ms);
    }

    fn yield_now(&mut self) {
        self.yields += 1;
        self.now += self.yield_step_ms as u64;
    }
}

/// Recording amplifier-enable pin.
pub struct MockAmpPin {
    /// Current line level.
    pub level: bool,
    /// Every level written, in order.
    pub writes: Vec<bool, 16>,
}

impl MockAmpPin {
    pub fn new() -> Self {
        Self {
            level: false,
            writes: Vec::new(),
        }
    }
}

impl Default for MockAmpPin {
    fn default() -> Self {
        Self::new()
    }
}

impl embedded_hal::digital::ErrorType for MockAmpPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for MockAmpPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level = false;
        let _ = self.writes.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level = true;
        let _ = self.writes.push(true);
        Ok(())
    }
}

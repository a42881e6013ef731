//! Driver lifecycle tests: bring-up, suspend/resume, stop

use i2s_chime::config::{AMP_STARTUP_DELAY_MS, SETTLE_DELAY_MS};
use i2s_chime::hal::mock::{MockAmpPin, MockBus, MockPlatform, Op};
use i2s_chime::{FaultCode, LogLevel, PeriphState, Signal, ToneDriver};

#[test]
fn test_initialize_sequence_order() {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());

    assert!(driver.initialize());
    assert_eq!(driver.periph_state(), PeriphState::Configured);

    let (bus, platform, _amp) = driver.release();

    // Clock handshake, teardown of stale state, then rebind and enable.
    assert_eq!(
        bus.ops.as_slice(),
        &[
            Op::ClearSignal(Signal::ClockStarted),
            Op::StartClock,
            Op::ClearSignal(Signal::ClockStarted),
            Op::Disable,
            Op::UnbindPins,
            Op::ClearSignal(Signal::FrameFetched),
            Op::ClearSignal(Signal::Stopped),
            Op::MaskIrqs,
            Op::BindPins,
            Op::SetMode,
            Op::Enable,
        ]
    );

    // Settle after disable, before rebind, after enable, then the
    // amplifier power-up delay.
    assert_eq!(
        platform.delays.as_slice(),
        &[
            SETTLE_DELAY_MS,
            SETTLE_DELAY_MS,
            SETTLE_DELAY_MS,
            AMP_STARTUP_DELAY_MS
        ]
    );
}

#[test]
fn test_initialize_binds_pins_and_mode() {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());
    driver.initialize();

    let (bus, _, _) = driver.release();
    let pins = bus.pins.expect("pins bound");
    let mode = bus.mode.expect("mode applied");

    assert_eq!(pins.bclk, i2s_chime::config::BCLK_PIN);
    assert_eq!(pins.lrclk, i2s_chime::config::LRCLK_PIN);
    assert_eq!(pins.dout, i2s_chime::config::DOUT_PIN);

    assert!(mode.master);
    assert!(mode.tx_only);
    assert!(mode.mono_duplicate);
    assert_eq!(mode.sample_bits, 16);
}

#[test]
fn test_initialize_is_idempotent() {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());

    assert!(driver.initialize());
    assert!(driver.initialize());

    let (bus, _, _) = driver.release();
    assert_eq!(bus.count(Op::Enable), 1, "second call must be a no-op");
}

#[test]
fn test_initialize_raises_amp_enable_line() {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());
    driver.initialize();

    let (_, _, amp) = driver.release();
    let amp = amp.unwrap();
    assert!(amp.level, "enable line left high after bring-up");
    assert_eq!(amp.writes.as_slice(), &[true]);
}

#[test]
fn test_initialize_without_amp_warns() {
    let mut driver = ToneDriver::without_amp(MockBus::new(), MockPlatform::new());
    assert!(driver.initialize());

    let mut warned = false;
    while let Some(record) = driver.log().drain() {
        if record.level == LogLevel::Warn && record.text().contains("enable line") {
            warned = true;
        }
    }
    assert!(warned, "missing enable line should be warned about");
}

#[test]
fn test_play_before_initialize_touches_no_hardware() {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());

    driver.play_tone(440, 100, 50);

    assert!(!driver.is_playing());
    assert_eq!(driver.faults().code, FaultCode::NotConfigured);
    assert_eq!(driver.faults().count, 1);

    let mut errored = false;
    while let Some(record) = driver.log().drain() {
        if record.level == LogLevel::Error {
            errored = true;
        }
    }
    assert!(errored);

    let (bus, _, _) = driver.release();
    assert!(bus.ops.is_empty(), "no register writes before initialize");
}

#[test]
fn test_stop_waits_for_stopped_signal() {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());
    driver.initialize();

    driver.stop();
    assert!(!driver.is_playing());

    let (bus, _, _) = driver.release();
    assert_eq!(bus.stops(), 1);
}

#[test]
fn test_stop_before_initialize_is_noop() {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());
    driver.stop();

    let (bus, _, _) = driver.release();
    assert!(bus.ops.is_empty());
}

#[test]
fn test_suspend_powers_down() {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());
    driver.initialize();

    driver.suspend();
    assert_eq!(driver.periph_state(), PeriphState::Suspended);

    let (bus, _, amp) = driver.release();
    // Stop handshake, then peripheral disable: one Disable from
    // bring-up plus one from suspend.
    assert_eq!(bus.stops(), 1);
    assert_eq!(bus.count(Op::Disable), 2);

    let amp = amp.unwrap();
    assert!(!amp.level, "enable line dropped on suspend");
    assert_eq!(amp.writes.as_slice(), &[true, false]);
}

#[test]
fn test_resume_restores_playback() {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());
    driver.initialize();

    driver.suspend();
    driver.resume();
    assert_eq!(driver.periph_state(), PeriphState::Configured);

    // Playback works identically after the round trip.
    driver.play_tone(440, 16, 50);
    assert_eq!(driver.faults().count, 0);

    let (bus, _, amp) = driver.release();
    assert_eq!(bus.transfers.as_slice(), &[256]);
    // Resume re-enables without re-running pin binding.
    assert_eq!(bus.count(Op::Enable), 2);
    assert_eq!(bus.count(Op::BindPins), 1);

    assert!(amp.unwrap().level);
}

#[test]
fn test_resume_without_suspend_is_noop() {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());
    driver.initialize();

    driver.resume();

    let (bus, _, _) = driver.release();
    assert_eq!(bus.count(Op::Enable), 1);
}

#[test]
fn test_suspend_when_uninitialized_is_noop() {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());
    driver.suspend();

    assert_eq!(driver.periph_state(), PeriphState::Uninitialized);
    let (bus, _, _) = driver.release();
    assert!(bus.ops.is_empty());
}

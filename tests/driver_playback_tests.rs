//! Playback tests: chunking, timing, melodies, timeout paths

use i2s_chime::config::{BUFFER_CAPACITY, NOTE_GAP_MS};
use i2s_chime::hal::mock::{MockAmpPin, MockBus, MockPlatform, Op};
use i2s_chime::{FaultCode, LogLevel, ToneDriver};

/// Delays recorded during bring-up (three settles plus the amplifier
/// power-up); playback assertions skip past them.
const INIT_DELAYS: usize = 4;

fn configured_driver() -> ToneDriver<MockBus, MockPlatform, MockAmpPin> {
    let mut driver = ToneDriver::new(MockBus::new(), MockPlatform::new(), MockAmpPin::new());
    assert!(driver.initialize());
    driver
}

#[test]
fn test_one_second_tone_chunking() {
    // 1000 ms at 16 kHz is 16000 samples: 62 full chunks plus a
    // 128-sample tail.
    let mut driver = configured_driver();
    driver.play_tone(440, 1000, 50);

    assert!(!driver.is_playing());
    assert_eq!(driver.faults().count, 0);

    let (bus, platform, _) = driver.release();

    assert_eq!(bus.transfers.len(), 63);
    assert!(bus.transfers[..62].iter().all(|&n| n == BUFFER_CAPACITY));
    assert_eq!(*bus.transfers.last().unwrap(), 128);

    // Every chunk is started and awaited to a stop.
    assert_eq!(bus.starts(), 63);
    assert_eq!(bus.stops(), 63);

    // The conservative wait never under-waits: chunk sleeps cover the
    // full requested duration.
    let chunk_sleep: u64 = platform.delays[INIT_DELAYS..]
        .iter()
        .map(|&ms| ms as u64)
        .sum();
    assert!(chunk_sleep >= 1000);
    // Bounded above by a fixed per-chunk overhead.
    assert!(chunk_sleep <= 1000 + 63);
}

#[test]
fn test_short_tone_minimum_one_chunk() {
    // Duration 0 clamps to 1 ms: 16 samples, one transfer.
    let mut driver = configured_driver();
    driver.play_tone(1000, 0, 50);

    let (bus, _, _) = driver.release();
    assert_eq!(bus.transfers.as_slice(), &[16]);
}

#[test]
fn test_duration_clamped_to_maximum() {
    // 10 s clamps to 2 s: 32000 samples in 125 full chunks.
    let mut driver = configured_driver();
    driver.play_tone(440, 10_000, 50);

    let (bus, _, _) = driver.release();
    assert_eq!(bus.transfers.len(), 125);
    assert_eq!(bus.transfers.iter().sum::<usize>(), 32_000);
}

#[test]
fn test_transfer_ordering_within_chunk() {
    let mut driver = configured_driver();
    driver.play_tone(440, 16, 50);

    let (bus, _, _) = driver.release();

    // Bind, clear stale signals, start; then the completion side
    // clears the fetch signal, stops, clears the stop signal.
    let chunk_ops: Vec<_> = bus
        .ops
        .iter()
        .skip_while(|&&op| op != Op::SetTransfer(256))
        .copied()
        .collect();
    assert_eq!(
        chunk_ops,
        vec![
            Op::SetTransfer(256),
            Op::ClearSignal(i2s_chime::Signal::FrameFetched),
            Op::ClearSignal(i2s_chime::Signal::Stopped),
            Op::Start,
            Op::ClearSignal(i2s_chime::Signal::FrameFetched),
            Op::Stop,
            Op::ClearSignal(i2s_chime::Signal::Stopped),
        ]
    );
}

#[test]
fn test_melody_plays_notes_in_order_with_gaps() {
    let mut driver = configured_driver();
    // 10 ms notes: one 160-sample chunk each.
    driver.play_melody(&[880, 660, 440], &[10, 10, 10], 50);

    let (bus, platform, _) = driver.release();

    assert_eq!(bus.transfers.as_slice(), &[160, 160, 160]);

    // N notes, N-1 gaps, in input order.
    assert_eq!(
        &platform.delays[INIT_DELAYS..],
        &[10, NOTE_GAP_MS, 10, NOTE_GAP_MS, 10]
    );
}

#[test]
fn test_melody_length_mismatch_plays_shorter_prefix() {
    let mut driver = configured_driver();
    driver.play_melody(&[880, 660, 440], &[10, 10], 50);

    let mut warned = false;
    while let Some(record) = driver.log().drain() {
        if record.level == LogLevel::Warn && record.text().contains("mismatch") {
            warned = true;
        }
    }
    assert!(warned);

    let (bus, _, _) = driver.release();
    assert_eq!(bus.transfers.len(), 2, "only the paired notes play");
}

#[test]
fn test_empty_melody_is_noop() {
    let mut driver = configured_driver();
    driver.play_melody(&[], &[], 50);

    let (bus, _, _) = driver.release();
    assert_eq!(bus.transfers.len(), 0);
}

#[test]
fn test_fetch_timeout_abandons_chunk_without_stop() {
    let mut bus = MockBus::new();
    bus.fetch_on_start = false;

    let mut driver = ToneDriver::new(bus, MockPlatform::new(), MockAmpPin::new());
    driver.initialize();
    driver.play_tone(440, 16, 50);

    assert!(!driver.is_playing());
    assert_eq!(driver.faults().code, FaultCode::FetchTimeout);
    assert_eq!(driver.faults().count, 1);

    let mut errored = false;
    while let Some(record) = driver.log().drain() {
        if record.level == LogLevel::Error && record.text().contains("fetch") {
            errored = true;
        }
    }
    assert!(errored);

    let (bus, platform, _) = driver.release();

    // The engine is left running: no stop command, no playback sleep.
    assert_eq!(bus.starts(), 1);
    assert_eq!(bus.stops(), 0);
    assert_eq!(platform.delays.len(), INIT_DELAYS);
}

#[test]
fn test_stop_timeout_is_counted_not_fatal() {
    let mut bus = MockBus::new();
    bus.stop_on_stop = false;

    let mut driver = ToneDriver::new(bus, MockPlatform::new(), MockAmpPin::new());
    driver.initialize();
    driver.play_tone(440, 16, 50);

    assert!(!driver.is_playing());
    assert_eq!(driver.faults().code, FaultCode::StopTimeout);

    let (bus, _, _) = driver.release();
    // The stop command was issued; only the handshake timed out.
    assert_eq!(bus.stops(), 1);
}

#[test]
fn test_synth_diagnostic_emitted_once() {
    let mut driver = configured_driver();
    driver.play_tone(440, 16, 50);
    driver.play_tone(660, 16, 50);

    let mut synth_records = 0;
    while let Some(record) = driver.log().drain() {
        if record.level == LogLevel::Debug && record.text().starts_with("synth:") {
            synth_records += 1;
        }
    }
    assert_eq!(synth_records, 1);
}

//! Chunk transfer scheduling.
//!
//! One chunk at a time: bind the buffer, start the engine, then hold
//! the caller until the hardware is demonstrably done. The hardware
//! reports when it has *fetched* the buffer, not when the last sample
//! has left the wire, so completion is a three-step wait: fetch signal,
//! a sleep for the chunk's computed playback duration, then a stop
//! handshake. Conservative, but never releases the caller early.

use crate::config::{FETCH_TIMEOUT_MS, SAMPLE_RATE_HZ, STOP_TIMEOUT_MS};
use crate::fault::{FaultCode, FaultState};
use crate::hal::{wait_signal, I2sBus, Platform, Signal};
use crate::logging::LogRing;
use crate::{drv_debug, drv_error};

/// Expected playback duration of `sample_count` samples, in ms.
///
/// Rounded up, minimum 1 ms, so the post-fetch sleep never under-waits.
#[inline]
pub(crate) fn chunk_duration_ms(sample_count: usize) -> u32 {
    let ms = (sample_count as u64 * 1000).div_ceil(SAMPLE_RATE_HZ as u64) as u32;
    ms.max(1)
}

/// Bind `samples` to the transfer engine and issue the start command.
///
/// Returns as soon as the command is issued; pair with
/// [`await_completion`].
pub(crate) fn start<B: I2sBus>(bus: &mut B, samples: &[i16]) {
    bus.set_transfer(samples);

    // Stale completion signals from the previous chunk (or an aborted
    // stop) must not satisfy this chunk's waits.
    bus.clear_signal(Signal::FrameFetched);
    bus.clear_signal(Signal::Stopped);

    bus.start();
}

/// Block until the chunk issued by [`start`] has been played out.
///
/// Waits (bounded) for the buffer-fetched signal, sleeps for the
/// chunk's playback duration, then stops the engine and waits (bounded)
/// for the stopped signal. Timeouts are logged and counted, never
/// fatal.
pub(crate) fn await_completion<B, P>(
    bus: &mut B,
    platform: &mut P,
    faults: &FaultState,
    log: &LogRing,
    sample_count: usize,
) where
    B: I2sBus,
    P: Platform,
{
    let expected_ms = chunk_duration_ms(sample_count);

    if !wait_signal(bus, platform, Signal::FrameFetched, FETCH_TIMEOUT_MS) {
        faults.set(FaultCode::FetchTimeout, sample_count as u32);
        drv_error!(
            log,
            platform.now_ms(),
            "buffer fetch timeout after {} ms",
            FETCH_TIMEOUT_MS
        );
        // TODO: force a stop here; a timed-out fetch currently leaves
        // the engine running on the last bound buffer.
        return;
    }
    bus.clear_signal(Signal::FrameFetched);

    platform.delay_ms(expected_ms);

    bus.stop();

    if !wait_signal(bus, platform, Signal::Stopped, STOP_TIMEOUT_MS) {
        faults.set(FaultCode::StopTimeout, sample_count as u32);
        drv_error!(
            log,
            platform.now_ms(),
            "stop timeout after {} ms",
            STOP_TIMEOUT_MS
        );
        return;
    }
    bus.clear_signal(Signal::Stopped);

    drv_debug!(
        log,
        platform.now_ms(),
        "chunk done: {} samples, {} ms",
        sample_count,
        expected_ms
    );
}

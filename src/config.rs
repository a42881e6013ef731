//! Module: config
//!
//! Purpose: Compile-time configuration for the tone driver.
//! Pin assignments, sample format, and the timing bounds of the
//! transfer scheduler all live here; nothing is parsed at runtime.
//!
//! Safety: Constants only.

/// Output sample rate in Hz.
///
/// Realized on the wire by [`MCK_DIVIDER`] and [`FRAME_RATIO`].
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Chunk buffer capacity in samples.
///
/// Longer tones are streamed as a sequence of buffer-sized chunks;
/// 256 samples at 16 kHz is 16 ms of audio per chunk.
pub const BUFFER_CAPACITY: usize = 256;

/// Maximum single-tone duration in ms. Longer requests are clamped to
/// keep the synchronous playback calls from blocking indefinitely.
pub const MAX_TONE_DURATION_MS: u32 = 2_000;

/// Silence inserted between melody notes, in ms.
pub const NOTE_GAP_MS: u32 = 20;

/// Bound on the wait for the buffer-fetched signal after a transfer
/// start, in ms.
pub const FETCH_TIMEOUT_MS: u32 = 50;

/// Bound on the wait for the stopped signal after a stop command,
/// in ms.
pub const STOP_TIMEOUT_MS: u32 = 100;

/// Settle delay after every peripheral enable/disable transition,
/// in ms.
pub const SETTLE_DELAY_MS: u32 = 10;

/// Amplifier power-up settle delay after raising the enable line,
/// in ms.
pub const AMP_STARTUP_DELAY_MS: u32 = 10;

/// Maximum representable sample magnitude (16-bit signed audio).
pub const FULL_SCALE: i16 = i16::MAX;

/// Master clock divider: 32 MHz / 32 = 1 MHz MCK.
pub const MCK_DIVIDER: u32 = 32;

/// Frame ratio: 64 MCK cycles per LRCK period, giving the target
/// sample rate together with [`MCK_DIVIDER`].
pub const FRAME_RATIO: u32 = 64;

// Pin map. GPIO numbers, not board silkscreen labels.

/// Bit clock (BCLK) output.
#[cfg(not(feature = "esp32p4"))]
pub const BCLK_PIN: u8 = 16;
/// Word-select clock (LRCLK) output.
#[cfg(not(feature = "esp32p4"))]
pub const LRCLK_PIN: u8 = 17;
/// Serial data out (DIN on the amplifier).
#[cfg(not(feature = "esp32p4"))]
pub const DOUT_PIN: u8 = 18;
/// Amplifier enable line (SD_MODE on the MAX98357A, active high).
/// `None` is a valid configuration; the driver then logs a warning at
/// bring-up and the amplifier must be enabled externally.
#[cfg(not(feature = "esp32p4"))]
pub const AMP_ENABLE_PIN: Option<u8> = Some(21);

/// Bit clock (BCLK) output.
#[cfg(feature = "esp32p4")]
pub const BCLK_PIN: u8 = 12;
/// Word-select clock (LRCLK) output.
#[cfg(feature = "esp32p4")]
pub const LRCLK_PIN: u8 = 13;
/// Serial data out (DIN on the amplifier).
#[cfg(feature = "esp32p4")]
pub const DOUT_PIN: u8 = 14;
/// Amplifier enable line (SD_MODE on the MAX98357A, active high).
#[cfg(feature = "esp32p4")]
pub const AMP_ENABLE_PIN: Option<u8> = Some(15);

//! Sine synthesis into the chunk buffer.
//!
//! Direct per-sample evaluation: each chunk restarts at phase zero, so
//! chunk boundaries are also cycle-aligned only when the frequency
//! divides the sample rate. Good enough for alert tones; anything
//! fancier belongs in a real synth.

use libm::{roundf, sinf};

use crate::config::{FULL_SCALE, SAMPLE_RATE_HZ};

/// Map a volume percentage to a peak sample amplitude.
///
/// Linear: 0 is silence, 100 is full scale. Out-of-range volume is
/// clamped rather than rejected.
#[inline]
pub fn amplitude_for(volume: u8) -> i16 {
    let volume = volume.min(100) as i32;
    (volume * FULL_SCALE as i32 / 100) as i16
}

/// Fill `buf` with quantized sine samples from index 0.
///
/// `sample_count` beyond the buffer length silently truncates; callers
/// stream longer tones as repeated chunks. Returns the number of
/// samples written.
///
/// Frequencies above the Nyquist rate alias; the caller picks sane
/// frequencies.
pub fn fill_sine(buf: &mut [i16], frequency_hz: u32, sample_count: usize, volume: u8) -> usize {
    let amplitude = amplitude_for(volume) as f32;
    let count = sample_count.min(buf.len());

    for (i, slot) in buf[..count].iter_mut().enumerate() {
        let t = i as f32 / SAMPLE_RATE_HZ as f32;
        let phase = 2.0 * core::f32::consts::PI * frequency_hz as f32 * t;
        *slot = roundf(amplitude * sinf(phase)) as i16;
    }

    count
}

/// Largest sample magnitude in the slice. Used for the one-time
/// synthesis diagnostic.
pub fn peak_magnitude(buf: &[i16]) -> u16 {
    buf.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BUFFER_CAPACITY;

    #[test]
    fn test_amplitude_mapping_endpoints() {
        assert_eq!(amplitude_for(0), 0);
        assert_eq!(amplitude_for(100), FULL_SCALE);
        // Clamped, not rejected.
        assert_eq!(amplitude_for(250), FULL_SCALE);
    }

    #[test]
    fn test_zero_volume_is_silence() {
        let mut buf = [0x55i16; 64];
        let written = fill_sine(&mut buf, 440, 64, 0);
        assert_eq!(written, 64);
        assert!(buf.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_zero_frequency_is_silence() {
        let mut buf = [0x55i16; 64];
        fill_sine(&mut buf, 0, 64, 100);
        assert!(buf.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_truncates_to_buffer_length() {
        let mut buf = [0i16; BUFFER_CAPACITY];
        let written = fill_sine(&mut buf, 440, BUFFER_CAPACITY * 4, 50);
        assert_eq!(written, BUFFER_CAPACITY);
    }

    #[test]
    fn test_leaves_tail_untouched() {
        let mut buf = [0x7F7Fi16; 16];
        let written = fill_sine(&mut buf, 1000, 4, 80);
        assert_eq!(written, 4);
        assert!(buf[4..].iter().all(|&s| s == 0x7F7F));
    }
}

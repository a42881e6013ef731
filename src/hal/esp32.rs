//! ESP-IDF backend for the HAL traits.
//!
//! Maps the register-level trait surface onto the ESP-IDF standard-mode
//! I2S channel driver. Pin routing and mode parameters are collected by
//! `bind_pins`/`set_mode` and applied when the channel is created on
//! the first `enable()`; the channel driver owns clocking and its own
//! ISRs, so `start_clock` and `mask_interrupts` reduce to bookkeeping.

use core::ptr;

use esp_idf_svc::sys;

use super::{I2sBus, Mode, PinConfig, Platform, Signal};
use crate::config::{BUFFER_CAPACITY, SAMPLE_RATE_HZ};

/// I2S transmit channel over ESP-IDF.
pub struct EspI2sBus {
    tx: sys::i2s_chan_handle_t,
    pins: Option<PinConfig>,
    mode: Mode,
    signals: [bool; 3],
    running: bool,
    pending: Option<(*const i16, usize)>,
}

// SAFETY: The channel handle is only touched from the single driver
// thread of control.
unsafe impl Send for EspI2sBus {}

impl EspI2sBus {
    pub fn new() -> Self {
        Self {
            tx: ptr::null_mut(),
            pins: None,
            mode: Mode::default(),
            signals: [false; 3],
            running: false,
            pending: None,
        }
    }

    fn signal_slot(&mut self, signal: Signal) -> &mut bool {
        match signal {
            Signal::ClockStarted => &mut self.signals[0],
            Signal::FrameFetched => &mut self.signals[1],
            Signal::Stopped => &mut self.signals[2],
        }
    }

    /// Create and initialize the channel from the collected pin and
    /// mode state. No-op when pins are unbound.
    fn create_channel(&mut self) {
        let Some(pins) = self.pins else {
            return;
        };
        if !self.tx.is_null() {
            return;
        }

        let chan_cfg = sys::i2s_chan_config_t {
            id: sys::i2s_port_t_I2S_NUM_0,
            role: if self.mode.master {
                sys::i2s_role_t_I2S_ROLE_MASTER
            } else {
                sys::i2s_role_t_I2S_ROLE_SLAVE
            },
            dma_desc_num: 4,
            dma_frame_num: BUFFER_CAPACITY as u32,
            auto_clear: true,
            ..Default::default()
        };

        // SAFETY: chan_cfg outlives the call; rx handle is unused
        // (transmit-only).
        unsafe {
            let _ = sys::esp!(sys::i2s_new_channel(
                &chan_cfg,
                &mut self.tx,
                ptr::null_mut(),
            ));
        }
        if self.tx.is_null() {
            return;
        }

        let std_cfg = sys::i2s_std_config_t {
            clk_cfg: sys::i2s_std_clk_config_t {
                sample_rate_hz: SAMPLE_RATE_HZ,
                clk_src: sys::soc_periph_i2s_clk_src_t_I2S_CLK_SRC_DEFAULT,
                mclk_multiple: sys::i2s_mclk_multiple_t_I2S_MCLK_MULTIPLE_256,
                ..Default::default()
            },
            slot_cfg: sys::i2s_std_slot_config_t {
                data_bit_width: sys::i2s_data_bit_width_t_I2S_DATA_BIT_WIDTH_16BIT,
                slot_bit_width: sys::i2s_slot_bit_width_t_I2S_SLOT_BIT_WIDTH_AUTO,
                // Mono source duplicated onto the single active lane.
                slot_mode: sys::i2s_slot_mode_t_I2S_SLOT_MODE_MONO,
                slot_mask: sys::i2s_std_slot_mask_t_I2S_STD_SLOT_LEFT,
                ws_width: self.mode.sample_bits as u32,
                ws_pol: false,
                bit_shift: true,
                ..Default::default()
            },
            gpio_cfg: sys::i2s_std_gpio_config_t {
                mclk: sys::gpio_num_t_GPIO_NUM_NC,
                bclk: pins.bclk as i32,
                ws: pins.lrclk as i32,
                dout: pins.dout as i32,
                din: sys::gpio_num_t_GPIO_NUM_NC,
                invert_flags: Default::default(),
            },
        };

        // SAFETY: tx is a valid handle from i2s_new_channel; std_cfg
        // outlives the call.
        unsafe {
            let _ = sys::esp!(sys::i2s_channel_init_std_mode(self.tx, &std_cfg));
        }
    }
}

impl Default for EspI2sBus {
    fn default() -> Self {
        Self::new()
    }
}

impl I2sBus for EspI2sBus {
    fn start_clock(&mut self) {
        // Clock tree bring-up is owned by the channel driver.
        *self.signal_slot(Signal::ClockStarted) = true;
    }

    fn bind_pins(&mut self, pins: &PinConfig) {
        self.pins = Some(*pins);
    }

    fn unbind_pins(&mut self) {
        self.pins = None;
    }

    fn set_mode(&mut self, mode: &Mode) {
        self.mode = *mode;
    }

    fn enable(&mut self) {
        self.create_channel();
        if self.tx.is_null() || self.running {
            return;
        }
        // SAFETY: tx is a valid initialized channel handle.
        unsafe {
            let _ = sys::esp!(sys::i2s_channel_enable(self.tx));
        }
        self.running = true;
    }

    fn disable(&mut self) {
        if self.tx.is_null() {
            return;
        }
        if self.running {
            // SAFETY: tx is a valid enabled channel handle.
            unsafe {
                let _ = sys::esp!(sys::i2s_channel_disable(self.tx));
            }
            self.running = false;
        }
    }

    fn mask_interrupts(&mut self) {
        // The channel driver registers and owns its ISRs; nothing is
        // exposed to mask at this layer.
    }

    fn clear_signal(&mut self, signal: Signal) {
        *self.signal_slot(signal) = false;
    }

    fn signal(&self, signal: Signal) -> bool {
        match signal {
            Signal::ClockStarted => self.signals[0],
            Signal::FrameFetched => self.signals[1],
            Signal::Stopped => self.signals[2],
        }
    }

    fn set_transfer(&mut self, samples: &[i16]) {
        self.pending = Some((samples.as_ptr(), samples.len()));
    }

    fn start(&mut self) {
        let Some((data, len)) = self.pending else {
            return;
        };
        if self.tx.is_null() {
            return;
        }
        if !self.running {
            // A previous chunk's stop handshake disabled the channel.
            // SAFETY: tx is a valid initialized channel handle.
            unsafe {
                let _ = sys::esp!(sys::i2s_channel_enable(self.tx));
            }
            self.running = true;
        }

        let mut written: usize = 0;
        // SAFETY: `data`/`len` come from the driver's chunk buffer,
        // which outlives the transfer (the driver blocks on completion
        // before refilling it).
        let result = unsafe {
            sys::esp!(sys::i2s_channel_write(
                self.tx,
                data.cast(),
                len * core::mem::size_of::<i16>(),
                &mut written,
                sys::TickType_t::MAX,
            ))
        };

        // The write returns once the DMA has consumed the buffer, which
        // is this hardware's buffer-fetched point.
        if result.is_ok() {
            *self.signal_slot(Signal::FrameFetched) = true;
        }
    }

    fn stop(&mut self) {
        if !self.tx.is_null() && self.running {
            // SAFETY: tx is a valid enabled channel handle.
            unsafe {
                let _ = sys::esp!(sys::i2s_channel_disable(self.tx));
            }
            self.running = false;
        }
        *self.signal_slot(Signal::Stopped) = true;
    }
}

/// FreeRTOS-backed clock, sleep, and yield.
pub struct EspPlatform;

impl EspPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EspPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for EspPlatform {
    fn now_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time is always safe to call.
        (unsafe { sys::esp_timer_get_time() } / 1000) as u64
    }

    fn delay_ms(&mut self, ms: u32) {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);
    }

    fn yield_now(&mut self) {
        // One tick cedes the core to equal-priority housekeeping tasks.
        // SAFETY: vTaskDelay is always safe to call from a task.
        unsafe { sys::vTaskDelay(1) };
    }
}

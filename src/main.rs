//! i2s-chime - ESP-IDF entry point
//!
//! Brings the tone driver up, plays a startup chime, then idles while
//! draining driver diagnostics to the console. Demonstrates
//! suspend/resume around the idle period.

#[cfg(target_os = "espidf")]
fn main() {
    use esp_idf_svc::hal::gpio::{AnyOutputPin, PinDriver};
    use esp_idf_svc::sys;

    use i2s_chime::config::AMP_ENABLE_PIN;
    use i2s_chime::hal::esp32::{EspI2sBus, EspPlatform};
    use i2s_chime::{logging, ToneDriver};

    // C5-ish beep up to an A5, then back down.
    const STARTUP_FREQS: [u32; 3] = [523, 880, 659];
    const STARTUP_DURS: [u32; 3] = [120, 120, 200];

    sys::link_patches();

    println!("{}", env!("VERSION_STRING"));

    let bus = EspI2sBus::new();
    let platform = EspPlatform::new();

    match AMP_ENABLE_PIN {
        Some(gpio) => {
            // SAFETY: the pin number comes from the board config and is
            // not used anywhere else in this binary.
            let amp_pin = unsafe { AnyOutputPin::new(gpio as i32) };
            match PinDriver::output(amp_pin) {
                Ok(amp) => run(ToneDriver::new(bus, platform, amp)),
                Err(_) => run(ToneDriver::without_amp(bus, platform)),
            }
        }
        None => run(ToneDriver::without_amp(bus, platform)),
    }

    fn run<B, P, A>(mut driver: ToneDriver<B, P, A>) -> !
    where
        B: i2s_chime::I2sBus,
        P: i2s_chime::Platform,
        A: embedded_hal::digital::OutputPin,
    {
        driver.initialize();
        driver.play_melody(&STARTUP_FREQS, &STARTUP_DURS, 60);
        drain_logs(&driver);

        loop {
            driver.suspend();
            drain_logs(&driver);

            // SAFETY: vTaskDelay is always safe to call from a task.
            unsafe { esp_idf_svc::sys::vTaskDelay(5_000) };

            driver.resume();
            driver.play_tone(880, 150, 40);
            drain_logs(&driver);
        }
    }

    fn drain_logs<B, P, A>(driver: &ToneDriver<B, P, A>)
    where
        B: i2s_chime::I2sBus,
        P: i2s_chime::Platform,
        A: embedded_hal::digital::OutputPin,
    {
        let mut line = [0u8; 160];
        while let Some(record) = driver.log().drain() {
            let len = logging::format_record(&record, &mut line);
            if let Ok(text) = core::str::from_utf8(&line[..len]) {
                print!("{}", text);
            }
        }

        let dropped = driver.log().dropped();
        if dropped > 0 {
            println!("[WARN] {} diagnostic records dropped", dropped);
            driver.log().reset_dropped();
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    // Hardware entry point; nothing to do on the host.
}

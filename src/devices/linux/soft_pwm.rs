//! Thread-driven software PWM on a plain GPIO line
//!
//! The L298N enable pin is not routed to a hardware PWM block, so its duty
//! cycle is generated by toggling the pin from a dedicated thread. Timing is
//! best-effort (`thread::sleep` granularity), which is fine for motor speed.

use super::sysfs::GpioPin;
use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Software PWM generator that owns its pin
pub struct SoftPwm {
    duty: Arc<AtomicU8>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SoftPwm {
    /// Start generating on `pin` at `frequency_hz` with 0% duty
    pub fn start(pin: GpioPin, frequency_hz: u32) -> Result<Self> {
        let duty = Arc::new(AtomicU8::new(0));
        let running = Arc::new(AtomicBool::new(true));
        let period = Duration::from_micros(1_000_000 / u64::from(frequency_hz.max(1)));

        let thread_duty = Arc::clone(&duty);
        let thread_running = Arc::clone(&running);
        let pin_number = pin.number();

        let handle = thread::Builder::new()
            .name(format!("soft-pwm-{}", pin_number))
            .spawn(move || pwm_loop(pin, period, thread_duty, thread_running))
            .map_err(|e| Error::Other(format!("Failed to spawn soft PWM thread: {}", e)))?;

        log::debug!("Soft PWM on GPIO {} at {} Hz", pin_number, frequency_hz);

        Ok(Self {
            duty,
            running,
            handle: Some(handle),
        })
    }

    /// Set duty cycle (0-100%)
    pub fn set_duty(&self, percent: u8) {
        self.duty.store(percent.min(100), Ordering::Relaxed);
    }

    pub fn duty(&self) -> u8 {
        self.duty.load(Ordering::Relaxed)
    }

    /// Stop the generator; the pin is left low and released
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SoftPwm {
    fn drop(&mut self) {
        self.stop();
    }
}

fn pwm_loop(pin: GpioPin, period: Duration, duty: Arc<AtomicU8>, running: Arc<AtomicBool>) {
    let mut level = None;
    let mut set = |high: bool| {
        if level != Some(high) {
            if let Err(e) = pin.write(high) {
                log::warn!("Soft PWM write on GPIO {} failed: {}", pin.number(), e);
            }
            level = Some(high);
        }
    };

    while running.load(Ordering::Relaxed) {
        match duty.load(Ordering::Relaxed) {
            0 => {
                set(false);
                thread::sleep(period);
            }
            100.. => {
                set(true);
                thread::sleep(period);
            }
            d => {
                let on = period * u32::from(d) / 100;
                set(true);
                thread::sleep(on);
                set(false);
                thread::sleep(period - on);
            }
        }
    }

    set(false);
}

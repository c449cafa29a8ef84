//! Oscillator calibration against a 1 ms reference window.
//!
//! The trim register of the RC oscillator is tuned so that the reference window (a USB
//! frame, or a window timed by an independent clock) measures as close as possible to
//! what the nominal clock would measure.
//! First a binary search over the 8 trim bits, then a scan of the three values around
//! the result.
//!
//! NOTE: the binary search tries trim values far above the optimum (up to 192 and more).
//! On low voltage designs this can briefly clock the core out of its safe range.

use crate::settings::{self, SettingsStore};

/// An oscillator with a trim register, plus a way to time it against a 1 ms reference.
pub trait FrameClock {
    fn trim(&self) -> u8;

    fn set_trim(&mut self, trim: u8);

    /// Oscillator cycles counted over the 1 ms reference window, in units of 7 cycles, i.e.
    /// proportional to the actual oscillator frequency.
    fn measure_frame_length(&mut self) -> u16;
}

/// Frame length a clock running at exactly `cpu_hz` measures, rounded to nearest.
///
/// A 1 ms window counted in 7 cycle steps, i.e. `1499 * cpu_hz / 10.5 MHz`.
pub const fn target_frame_length(cpu_hz: u32) -> u16 {
    ((1499 * cpu_hz as u64 + 5_250_000) / 10_500_000) as u16
}

/// Find the trim value that best matches `target`, apply it and return it.
pub fn calibrate<C: FrameClock>(clock: &mut C, target: u16) -> u8 {
    let mut step: u8 = 128;
    let mut trial: u8 = 0;

    // Binary search, leaves us within +/- 1 of the optimum
    while step > 0 {
        clock.set_trim(trial + step);
        if clock.measure_frame_length() < target {
            // frequency still too low
            trial += step;
        }
        step >>= 1;
    }

    // Neighbourhood search, clamped to the trim range
    let mut optimum = trial;
    let mut optimum_dev = u16::MAX;
    for candidate in trial.saturating_sub(1)..=trial.saturating_add(1) {
        clock.set_trim(candidate);
        let dev = clock.measure_frame_length().abs_diff(target);
        if dev < optimum_dev {
            optimum_dev = dev;
            optimum = candidate;
        }
    }

    clock.set_trim(optimum);
    optimum
}

/// Bus reset handler: recalibrate and persist the result for the next boot.
pub fn on_bus_reset<C: FrameClock, S: SettingsStore>(
    clock: &mut C,
    store: &mut S,
    target: u16,
) -> u8 {
    let trim = calibrate(clock, target);
    settings::store_calibration(store, trim);
    trim
}

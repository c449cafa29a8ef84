//! Timing base: a coarse tick counter driven by a free-running hardware timer.
//!
//! All delays in the crate are counted in ticks. One tick is one timer overflow period,
//! ~15.9 ms (~62.94 Hz), the rate of an 8-bit counter fed with 16.5 MHz / 1024.

/// Length of one tick in microseconds
pub const TICK_MICROS: u32 = 15_888;

/// Something that periodically overflows, e.g. a hardware timer.
pub trait TickSource {
    /// Report (and clear) an overflow observed since the last call.
    ///
    /// Must be called at least once per overflow period, otherwise overflows are lost.
    fn take_overflow(&mut self) -> bool;
}

/// Convert milliseconds to ticks, rounded to nearest and saturated to a script hold.
pub const fn ms_to_ticks(ms: u32) -> u8 {
    let ticks = (ms as u64 * 1000 + TICK_MICROS as u64 / 2) / TICK_MICROS as u64;
    if ticks > u8::MAX as u64 {
        u8::MAX
    } else {
        ticks as u8
    }
}

/// The delay currently being waited out.
///
/// The wait is over when `target == 1`: the counter collapses to its minimum once
/// `elapsed` reaches `target`, and stays expired until a new delay is set.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DelayCounter {
    target: u16,
    elapsed: u16,
}

impl DelayCounter {
    /// A counter that is already expired
    pub const fn new() -> Self {
        DelayCounter {
            target: 1,
            elapsed: 0,
        }
    }

    /// Start waiting `ticks` ticks. 0 and 1 both mean "expired".
    pub fn set_delay(&mut self, ticks: u16) {
        self.target = ticks.max(1);
        self.elapsed = 0;
    }

    /// Account for at most one overflow of the tick source.
    pub fn poll<T: TickSource>(&mut self, ticks: &mut T) {
        if ticks.take_overflow() {
            self.elapsed = self.elapsed.saturating_add(1);
            if self.elapsed >= self.target {
                self.target = 1;
                self.elapsed = 0;
            }
        }
    }

    pub fn is_expired(&self) -> bool {
        self.target == 1
    }

    pub fn target(&self) -> u16 {
        self.target
    }

    pub fn elapsed(&self) -> u16 {
        self.elapsed
    }
}

impl Default for DelayCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Tick source that overflows on every other poll
    pub struct FakeTicks {
        pub polls: u32,
    }

    impl TickSource for FakeTicks {
        fn take_overflow(&mut self) -> bool {
            self.polls += 1;
            self.polls % 2 == 0
        }
    }

    /// Tick source that overflows on every poll
    pub struct EveryPoll;

    impl TickSource for EveryPoll {
        fn take_overflow(&mut self) -> bool {
            true
        }
    }

    #[test]
    fn new_counter_is_expired() {
        let delay = DelayCounter::new();
        assert!(delay.is_expired());
        assert_eq!(delay.target(), 1);
    }

    #[test]
    fn can_wait_out_a_delay() {
        let mut delay = DelayCounter::new();
        let mut ticks = EveryPoll;

        delay.set_delay(6);
        for elapsed in 1..6 {
            delay.poll(&mut ticks);
            assert!(!delay.is_expired());
            assert_eq!(delay.elapsed(), elapsed);
        }

        delay.poll(&mut ticks);
        assert!(delay.is_expired());
        assert_eq!(delay.elapsed(), 0);
    }

    #[test]
    fn only_overflows_count() {
        let mut delay = DelayCounter::new();
        let mut ticks = FakeTicks { polls: 0 };

        delay.set_delay(3);
        for _ in 0..5 {
            delay.poll(&mut ticks);
        }
        assert!(!delay.is_expired());
        assert_eq!(delay.elapsed(), 2);

        delay.poll(&mut ticks);
        assert!(delay.is_expired());
    }

    #[test]
    fn setting_a_delay_restarts_the_count() {
        let mut delay = DelayCounter::new();
        let mut ticks = EveryPoll;

        delay.set_delay(10);
        delay.poll(&mut ticks);
        delay.poll(&mut ticks);
        assert_eq!(delay.elapsed(), 2);

        delay.set_delay(4);
        assert_eq!(delay.elapsed(), 0);
        assert_eq!(delay.target(), 4);
    }

    #[test]
    fn expired_counter_stays_expired() {
        let mut delay = DelayCounter::new();
        let mut ticks = EveryPoll;

        for _ in 0..100 {
            delay.poll(&mut ticks);
            assert!(delay.is_expired());
        }
    }

    #[test]
    fn zero_delay_is_expired() {
        let mut delay = DelayCounter::new();
        delay.set_delay(0);
        assert!(delay.is_expired());
    }

    #[test]
    fn can_convert_ms_to_ticks() {
        assert_eq!(ms_to_ticks(0), 0);
        assert_eq!(ms_to_ticks(16), 1);
        assert_eq!(ms_to_ticks(1000), 63);
        assert_eq!(ms_to_ticks(60_000), u8::MAX);
    }
}

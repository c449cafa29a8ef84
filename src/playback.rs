//! Script playback.
//!
//! The player walks the script one report at a time. Every script key (press) is followed
//! by an all-zero report (release) so the host sees distinct key down / key up events even
//! for repeated keys. At the end of the script a final release is sent and playback
//! restarts after a long, jittered pause.
//!
//! Nothing here blocks: `Player::step` is called once per main loop iteration and only
//! emits when the link layer has a free slot and the current delay has expired.

use rand::{Rng, RngCore};

use crate::report::{Report, ReportBuilder};
use crate::script::{Script, ScriptEntry, ENTRY_LEN};
use crate::timing::DelayCounter;
use crate::usb::ReportSink;

/// Playback timing, in ticks (~63 per second)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackConfig {
    /// Wait before the first report, gives the host time to finish enumeration
    pub initial_delay: u16,
    /// Fixed part of the pause between two script runs
    pub restart_base: u16,
    /// Upper bound (inclusive) of the random part of that pause, at least 1
    pub restart_jitter: u16,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            // ~10 s
            initial_delay: 630,
            // ~45 s
            restart_base: 2835,
            // up to ~520 s more
            restart_jitter: 32767,
        }
    }
}

/// Where the player is at, as seen from the main loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Waiting out the startup delay, nothing sent yet
    Dormant,
    /// Waiting out a script hold
    IdleWait,
    /// Next report is a script key
    Press,
    /// Next report is all keys up
    Release,
    /// Script finished, waiting out the restart pause
    EndPause,
}

/// What a successful `step` sent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Emission {
    Press(ScriptEntry),
    Release,
    /// Final release of a run; the next run starts after `pause` ticks
    Restart { pause: u16 },
}

pub struct Player<'a, R> {
    script: Script<'a>,
    config: PlaybackConfig,
    rng: R,
    reports: ReportBuilder,
    // byte offset of the next entry
    offset: usize,
    started: bool,
    pausing: bool,
}

impl<'a, R: RngCore> Player<'a, R> {
    /// Create a player and arm the startup delay.
    pub fn new(
        script: Script<'a>,
        config: PlaybackConfig,
        rng: R,
        delay: &mut DelayCounter,
    ) -> Self {
        delay.set_delay(config.initial_delay);
        Player {
            script,
            config,
            rng,
            reports: ReportBuilder::new(),
            offset: 0,
            started: false,
            pausing: false,
        }
    }

    pub fn state(&self, delay: &DelayCounter) -> State {
        if !delay.is_expired() {
            if !self.started {
                State::Dormant
            } else if self.pausing {
                State::EndPause
            } else {
                State::IdleWait
            }
        } else if self.offset >= self.script.len() || self.reports.count() & 1 == 1 {
            State::Release
        } else {
            State::Press
        }
    }

    /// Emit at most one report. Returns `Ok(None)` when the slot is busy or the delay has
    /// not expired yet; nothing advances when the sink refuses the report.
    pub fn step<S: ReportSink>(
        &mut self,
        sink: &mut S,
        delay: &mut DelayCounter,
    ) -> Result<Option<Emission>, S::Error> {
        if !sink.is_ready() || !delay.is_expired() {
            return Ok(None);
        }

        let emission = match self.script.entry_at(self.offset) {
            Some(_) if self.reports.count() & 1 == 1 => {
                sink.send_report(&Report::RELEASE)?;
                self.reports.build(0, 0);
                Emission::Release
            }
            Some(entry) => {
                sink.send_report(&Report::new(entry.modifier, entry.keycode))?;
                self.reports.build(entry.modifier, entry.keycode);

                // A zero hold leaves the delay expired: next entry plays right away
                if entry.hold_ticks != 0 {
                    delay.set_delay(u16::from(entry.hold_ticks) + 1);
                }
                self.offset += ENTRY_LEN;
                Emission::Press(entry)
            }
            None => {
                sink.send_report(&Report::RELEASE)?;
                self.reports.build(0, 0);
                self.offset = 0;
                self.reports.reset_count();

                let jitter = self.rng.gen_range(1..=self.config.restart_jitter.max(1));
                let pause = self.config.restart_base.saturating_add(jitter);
                delay.set_delay(pause);
                Emission::Restart { pause }
            }
        };

        self.started = true;
        self.pausing = matches!(emission, Emission::Restart { .. });
        Ok(Some(emission))
    }

    /// Byte offset of the next script entry
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The last report handed to the link layer
    pub fn last_report(&self) -> Report {
        self.reports.current()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }
}

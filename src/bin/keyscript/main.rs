//! Keystroke playback firmware for the Tiny2040: replays the built-in script forever,
//! with a random pause between runs.

#![no_std]
#![no_main]

use bsp::entry;

use defmt::{debug, info, warn};
use defmt_rtt as _;

// Device specific
use pimoroni_tiny2040 as bsp;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use keyscript::board;
use keyscript::calibrate::{self, target_frame_length};
use keyscript::settings;
use keyscript::usb::KeyboardUsb;
use keyscript::{DelayCounter, PlaybackConfig, Player, Script};

mod payload;

/// Entry point to our bare-metal application.
///
/// The `#[entry]` macro ensures the Cortex-M start-up code calls this function
/// as soon as all global variables are initialised.
#[entry]
fn main() -> ! {
    let mut board = board::setup();
    info!("keyscript: {} script bytes", payload::PAYLOAD.len());

    // Start from the trim found last time, the host may not talk to an uncalibrated device
    match settings::seed_oscillator(&board.settings, &mut board.oscillator) {
        Some(trim) => info!("stored trim: {}", trim),
        None => info!("no stored trim"),
    }

    // Let the host forget about the previous session before (re)appearing
    board::settle(&mut board.timer);

    let mut usb = KeyboardUsb::new(board.usb_bus).expect("usb device strings");
    let target = target_frame_length(board::TRIM_TARGET_HZ);

    let rng = SmallRng::seed_from_u64(board.oscillator.rng().next_u64());
    let mut delay = DelayCounter::new();
    let mut player = Player::new(
        Script::new(&payload::PAYLOAD),
        PlaybackConfig::default(),
        rng,
        &mut delay,
    );

    board::start_watchdog(&mut board.watchdog);

    loop {
        board.watchdog.feed();

        if usb.poll() {
            let trim =
                calibrate::on_bus_reset(&mut board.oscillator, &mut board.settings, target);
            info!("bus reset, trim: {}", trim);
        }

        match player.step(&mut usb, &mut delay) {
            Ok(Some(emission)) => debug!("{}", emission),
            Ok(None) => {}
            Err(err) => warn!("report refused: {}", defmt::Debug2Format(&err)),
        }

        delay.poll(&mut board.ticks);
    }
}

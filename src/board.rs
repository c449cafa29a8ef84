//! Tiny2040 (rp2040) side of the external contracts.
//!
//! - ticks: the 1 MHz system timer, cut into ~15.9 ms periods
//! - oscillator: the ring oscillator, trimmed through its stage drive strengths and timed
//!   by the frequency counter against clk_ref (12 MHz crystal) over ~1 ms
//! - settings: the last 4k sector of the on-board flash
#![allow(static_mut_refs)]

use panic_halt as _;

// Device specific
use pimoroni_tiny2040 as bsp;

use bsp::hal;
use bsp::hal::fugit::MicrosDurationU32;
use bsp::hal::pac;
use bsp::hal::rom_data;
use bsp::hal::rosc::{Enabled, RingOscillator};

use embedded_hal::delay::DelayNs;
use usb_device::class_prelude::UsbBusAllocator;

use crate::calibrate::FrameClock;
use crate::flash::{self, RomFlash, PAGE_SIZE, SECTOR_SIZE};
use crate::settings::SettingsStore;
use crate::timing::{TickSource, TICK_MICROS};

/// How long the device stays off the bus at boot (host forgets the previous session)
pub const SETTLE_MS: u32 = 300;

/// Watchdog timeout, the main loop must come around faster than this
pub const WATCHDOG_PERIOD: MicrosDurationU32 = MicrosDurationU32::millis(1000);

/// Frequency the ring oscillator is trimmed to
pub const TRIM_TARGET_HZ: u32 = 8_250_000;

/// clk_ref runs from the 12 MHz crystal, the frequency counter's reference
const REF_KHZ: u32 = 12_000;

// Flash layout (8MB on the Tiny2040), settings live in the last sector
const FLASH_SIZE: u32 = 8 * 1024 * 1024;
const SETTINGS_OFFSET: u32 = FLASH_SIZE - SECTOR_SIZE;
const XIP_BASE: u32 = 0x1000_0000;

/// The USB Bus Driver, needs to outlive everything built on it
static mut USB_BUS: Option<UsbBusAllocator<hal::usb::UsbBus>> = None;

/// Everything the main loop needs from the silicon
pub struct Board {
    pub usb_bus: &'static UsbBusAllocator<hal::usb::UsbBus>,
    pub timer: hal::Timer,
    pub ticks: TimerTicks,
    pub oscillator: RingOscillatorTrim,
    pub settings: FlashSettings,
    pub watchdog: hal::Watchdog,
}

/// Sets up the silicon. The USB bus is created but the device is not on the bus until
/// it is first polled.
pub fn setup() -> Board {
    // Grab our singleton objects
    let mut pac = pac::Peripherals::take().unwrap();

    // Set up the watchdog driver - needed by the clock setup code
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    // Configure the clocks
    //
    // The default is to generate a 125 MHz system clock
    let clocks = hal::clocks::init_clocks_and_plls(
        bsp::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    // Prepare timer
    let timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS, &clocks);

    let usb_bus = UsbBusAllocator::new(hal::usb::UsbBus::new(
        pac.USBCTRL_REGS,
        pac.USBCTRL_DPRAM,
        clocks.usb_clock,
        true,
        &mut pac.RESETS,
    ));

    // Note (safety): This is safe as the bus is only ever set here, and interrupts are
    // not used
    let usb_bus = unsafe { USB_BUS.insert(usb_bus) };

    Board {
        usb_bus,
        timer,
        ticks: TimerTicks::new(timer),
        oscillator: RingOscillatorTrim::new(pac.ROSC),
        settings: FlashSettings,
        watchdog,
    }
}

/// Ticks cut from the 1 MHz system timer
pub struct TimerTicks {
    timer: hal::Timer,
    next_overflow: u64,
}

impl TimerTicks {
    pub fn new(timer: hal::Timer) -> Self {
        let now = timer.get_counter().ticks();
        TimerTicks {
            timer,
            next_overflow: now + TICK_MICROS as u64,
        }
    }
}

impl TickSource for TimerTicks {
    fn take_overflow(&mut self) -> bool {
        let now = self.timer.get_counter().ticks();
        if now < self.next_overflow {
            return false;
        }

        // One period per call: a late poll catches up over the next polls
        self.next_overflow += TICK_MICROS as u64;
        true
    }
}

/// The ring oscillator, with the 8 bit trim spread over the drive strength of its 8 stages
pub struct RingOscillatorTrim {
    rosc: RingOscillator<Enabled>,
    trim: u8,
}

impl RingOscillatorTrim {
    pub fn new(rosc: pac::ROSC) -> Self {
        RingOscillatorTrim {
            rosc: RingOscillator::new(rosc).initialize(),
            trim: 0,
        }
    }

    /// The oscillator as a (slow) random source, for seeding the playback jitter
    pub fn rng(&mut self) -> &mut RingOscillator<Enabled> {
        &mut self.rosc
    }

    /// Thermometer-coded drive strengths (0b000, 0b001, 0b011, 0b111) for each stage.
    ///
    /// The 25 levels (0..=24 "strength steps") are spread evenly over the stages, so the
    /// frequency never decreases as the trim grows.
    fn drive_strengths(trim: u8) -> [u8; 8] {
        let level = trim as u32 * 24 / 255;
        let mut ds = [0u8; 8];
        for (stage, d) in ds.iter_mut().enumerate() {
            let steps = level / 8 + u32::from((stage as u32) < level % 8);
            *d = ((1u32 << steps) - 1) as u8;
        }
        ds
    }
}

impl FrameClock for RingOscillatorTrim {
    fn trim(&self) -> u8 {
        self.trim
    }

    fn set_trim(&mut self, trim: u8) {
        let ds = Self::drive_strengths(trim);

        // Note (safety): the HAL driver only touches CTRL and RANDOMBIT, the drive
        // strengths are ours
        let rosc = unsafe { &*pac::ROSC::ptr() };
        rosc.freqa().write(|w| unsafe {
            w.passwd()
                .pass()
                .ds0()
                .bits(ds[0])
                .ds1()
                .bits(ds[1])
                .ds2()
                .bits(ds[2])
                .ds3()
                .bits(ds[3])
        });
        rosc.freqb().write(|w| unsafe {
            w.passwd()
                .pass()
                .ds4()
                .bits(ds[4])
                .ds5()
                .bits(ds[5])
                .ds6()
                .bits(ds[6])
                .ds7()
                .bits(ds[7])
        });
        self.trim = trim;
    }

    fn measure_frame_length(&mut self) -> u16 {
        // Note (safety): clocks are owned by the HAL after setup, the frequency counter
        // registers are not touched by it
        let clocks = unsafe { &*pac::CLOCKS::ptr() };

        while clocks.fc0_status().read().running().bit_is_set() {}

        clocks
            .fc0_ref_khz()
            .write(|w| unsafe { w.fc0_ref_khz().bits(REF_KHZ) });
        clocks
            .fc0_interval()
            .write(|w| unsafe { w.fc0_interval().bits(10) });
        clocks
            .fc0_min_khz()
            .write(|w| unsafe { w.fc0_min_khz().bits(0) });
        clocks
            .fc0_max_khz()
            .write(|w| unsafe { w.fc0_max_khz().bits(0x01ff_ffff) });
        clocks.fc0_src().write(|w| w.fc0_src().rosc_clksrc());

        while clocks.fc0_status().read().done().bit_is_clear() {}

        // kHz is cycles per ms, counted in 7 cycle steps
        let khz = clocks.fc0_result().read().khz().bits();
        (khz / 7).min(u16::MAX as u32) as u16
    }
}

/// One settings page at the start of the last flash sector
pub struct FlashSettings;

impl SettingsStore for FlashSettings {
    fn read_byte(&self, offset: usize) -> u8 {
        let base = (XIP_BASE + SETTINGS_OFFSET) as *const u8;
        // Note (safety): the settings sector is always mapped through XIP
        unsafe { core::ptr::read_volatile(base.add(offset % PAGE_SIZE)) }
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        let page = flash::patched_page(|ix| self.read_byte(ix), offset, value);

        // Resolved now: the lookup code lives in flash
        let rom = RomFlash {
            connect_internal_flash: rom_data::connect_internal_flash::ptr(),
            flash_exit_xip: rom_data::flash_exit_xip::ptr(),
            flash_range_erase: rom_data::flash_range_erase::ptr(),
            flash_range_program: rom_data::flash_range_program::ptr(),
            flash_flush_cache: rom_data::flash_flush_cache::ptr(),
            flash_enter_cmd_xip: rom_data::flash_enter_cmd_xip::ptr(),
        };

        // No code may run from flash while it is being programmed. Core 1 is never
        // started.
        critical_section::with(|_| unsafe {
            flash::erase_and_program(&rom, SETTINGS_OFFSET, page.as_ptr())
        });
    }
}

/// Start the watchdog (called once the slow bring-up is over)
pub fn start_watchdog(watchdog: &mut hal::Watchdog) {
    watchdog.start(WATCHDOG_PERIOD);
}

/// Stay off the bus long enough for the host to drop the previous session
pub fn settle(timer: &mut hal::Timer) {
    timer.delay_ms(SETTLE_MS);
}


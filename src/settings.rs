//! Byte-level persistent settings (EEPROM-like).
//!
//! The only setting is the oscillator trim found by the last calibration.

use crate::calibrate::FrameClock;

/// Where the calibration byte lives
pub const CALIBRATION_OFFSET: usize = 0;

/// Value of a byte that was never written (erased flash / EEPROM)
pub const UNWRITTEN: u8 = 0xff;

/// Durable single-byte storage, surviving power cycles
pub trait SettingsStore {
    fn read_byte(&self, offset: usize) -> u8;

    fn write_byte(&mut self, offset: usize, value: u8);
}

/// The trim value saved by the last calibration, if there is one
pub fn load_calibration<S: SettingsStore>(store: &S) -> Option<u8> {
    match store.read_byte(CALIBRATION_OFFSET) {
        UNWRITTEN => None,
        trim => Some(trim),
    }
}

/// Save a trim value. Unchanged values are not rewritten, to spare the flash.
pub fn store_calibration<S: SettingsStore>(store: &mut S, trim: u8) {
    if store.read_byte(CALIBRATION_OFFSET) != trim {
        store.write_byte(CALIBRATION_OFFSET, trim);
    }
}

/// Boot time: apply the trim saved last time (if any) before the first calibration.
pub fn seed_oscillator<S: SettingsStore, C: FrameClock>(store: &S, clock: &mut C) -> Option<u8> {
    let trim = load_calibration(store)?;
    clock.set_trim(trim);
    Some(trim)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::calibrate::tests::LinearOscillator;

    /// An erased 16 byte store that counts writes
    pub struct MemoryStore {
        pub bytes: [u8; 16],
        pub writes: usize,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            MemoryStore {
                bytes: [UNWRITTEN; 16],
                writes: 0,
            }
        }
    }

    impl SettingsStore for MemoryStore {
        fn read_byte(&self, offset: usize) -> u8 {
            self.bytes[offset]
        }

        fn write_byte(&mut self, offset: usize, value: u8) {
            self.writes += 1;
            self.bytes[offset] = value;
        }
    }

    #[test]
    fn erased_store_has_no_calibration() {
        let store = MemoryStore::new();
        assert_eq!(load_calibration(&store), None);
    }

    #[test]
    fn can_store_and_load_calibration() {
        let mut store = MemoryStore::new();
        store_calibration(&mut store, 0x5a);

        assert_eq!(load_calibration(&store), Some(0x5a));
        assert_eq!(store.bytes[CALIBRATION_OFFSET], 0x5a);
    }

    #[test]
    fn unchanged_trim_is_not_rewritten() {
        let mut store = MemoryStore::new();
        store_calibration(&mut store, 100);
        store_calibration(&mut store, 100);
        assert_eq!(store.writes, 1);

        store_calibration(&mut store, 101);
        assert_eq!(store.writes, 2);
    }

    #[test]
    fn boot_seeds_stored_trim() {
        let mut store = MemoryStore::new();
        store_calibration(&mut store, 42);

        let mut osc = LinearOscillator::new(0, 1);
        assert_eq!(seed_oscillator(&store, &mut osc), Some(42));
        assert_eq!(osc.trim(), 42);
    }

    #[test]
    fn boot_leaves_oscillator_alone_when_unwritten() {
        let store = MemoryStore::new();
        let mut osc = LinearOscillator::new(0, 1);
        osc.trim = 77;

        assert_eq!(seed_oscillator(&store, &mut osc), None);
        assert_eq!(osc.trim(), 77);
        assert!(osc.tried.is_empty());
    }
}

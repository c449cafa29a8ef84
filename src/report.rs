//! USB Keyboard (HID class) reports

/// Report descriptor of the simplified keyboard.
///
/// No boot protocol, no LED output report and a single non-modifier key, which keeps input
/// reports at 2 bytes: the modifier bitmask, then one keycode (0..=101).
pub static REPORT_DESCRIPTOR: [u8; 35] = [
    0x05, 0x01, // USAGE_PAGE (Generic Desktop)
    0x09, 0x06, // USAGE (Keyboard)
    0xa1, 0x01, // COLLECTION (Application)
    0x05, 0x07, //   USAGE_PAGE (Keyboard)
    0x19, 0xe0, //   USAGE_MINIMUM (Keyboard LeftControl)
    0x29, 0xe7, //   USAGE_MAXIMUM (Keyboard Right GUI)
    0x15, 0x00, //   LOGICAL_MINIMUM (0)
    0x25, 0x01, //   LOGICAL_MAXIMUM (1)
    0x75, 0x01, //   REPORT_SIZE (1)
    0x95, 0x08, //   REPORT_COUNT (8)
    0x81, 0x02, //   INPUT (Data,Var,Abs)
    0x95, 0x01, //   REPORT_COUNT (1)
    0x75, 0x08, //   REPORT_SIZE (8)
    0x25, 0x65, //   LOGICAL_MAXIMUM (101)
    0x19, 0x00, //   USAGE_MINIMUM (Reserved (no event indicated))
    0x29, 0x65, //   USAGE_MAXIMUM (Keyboard Application)
    0x81, 0x00, //   INPUT (Data,Ary,Abs)
    0xc0, // END_COLLECTION
];

/// Size of an input report in bytes
pub const REPORT_LEN: usize = 2;

/// One input report: modifier bitmask and a single keycode (0 = no key)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    pub modifier: u8,
    pub keycode: u8,
}

impl Report {
    /// All keys up
    pub const RELEASE: Report = Report {
        modifier: 0,
        keycode: 0,
    };

    pub const fn new(modifier: u8, keycode: u8) -> Self {
        Report { modifier, keycode }
    }

    pub const fn as_bytes(&self) -> [u8; REPORT_LEN] {
        [self.modifier, self.keycode]
    }

    pub const fn is_release(&self) -> bool {
        self.modifier == 0 && self.keycode == 0
    }
}

/// The report buffer plus a wrapping count of the reports built into it.
///
/// The count only matters for its parity: the player alternates script keys (even) with
/// releases (odd).
#[derive(Clone, Debug, Default)]
pub struct ReportBuilder {
    report: Report,
    count: u8,
}

impl ReportBuilder {
    pub const fn new() -> Self {
        ReportBuilder {
            report: Report::RELEASE,
            count: 0,
        }
    }

    /// Fill the buffer and bump the count. Keycodes are passed through unchecked.
    pub fn build(&mut self, modifier: u8, keycode: u8) -> Report {
        self.count = self.count.wrapping_add(1);
        self.report = Report::new(modifier, keycode);
        self.report
    }

    pub fn current(&self) -> Report {
        self.report
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn reset_count(&mut self) {
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_declares_two_byte_reports() {
        // 8 x 1 bit of modifiers, then 1 x 8 bit keycode
        assert_eq!(&REPORT_DESCRIPTOR[16..20], &[0x75, 0x01, 0x95, 0x08]);
        assert_eq!(&REPORT_DESCRIPTOR[22..26], &[0x95, 0x01, 0x75, 0x08]);
        assert_eq!(REPORT_DESCRIPTOR[27], 101);
        assert_eq!(REPORT_DESCRIPTOR.last(), Some(&0xc0));
    }

    #[test]
    fn can_build_report() {
        let mut builder = ReportBuilder::new();
        let report = builder.build(0x02, 0x04);

        assert_eq!(report.as_bytes(), [0x02, 0x04]);
        assert_eq!(builder.current(), report);
        assert_eq!(builder.count(), 1);
    }

    #[test]
    fn keycodes_are_not_validated() {
        let mut builder = ReportBuilder::new();
        assert_eq!(builder.build(0, 0xff).keycode, 0xff);
    }

    #[test]
    fn count_wraps() {
        let mut builder = ReportBuilder::new();
        for _ in 0..256 {
            builder.build(0, 0);
        }
        assert_eq!(builder.count(), 0);

        builder.build(0, 0);
        builder.reset_count();
        assert_eq!(builder.count(), 0);
    }

    #[test]
    fn release_is_all_zero() {
        assert!(Report::RELEASE.is_release());
        assert_eq!(Report::RELEASE.as_bytes(), [0, 0]);
        assert!(!Report::new(0x02, 0).is_release());
    }
}
